//! Named bindings held by a context: aliases, templates, global state
//! labels, custom properties and custom action pointers

use std::sync::Arc;

use log::debug;

use crate::entity::{
    CustomBitflag, CustomProperty, DehActionPointer, DehAmmo, DehSound, DehThing, DehWeapon,
    EntityKind,
};
use crate::error::{Error, Result};
use crate::feature::FeatureLevel;

use super::{NameMap, PatchContext};

impl PatchContext {
    /// Bind a name to a thing slot
    pub fn set_thing_alias(&mut self, name: &str, index: i32) -> Result<()> {
        self.check_index_range(EntityKind::Thing, index, self.thing_count())?;
        self.thing_aliases.insert(name, index);
        Ok(())
    }

    /// Thing slot bound to a name
    pub fn thing_alias(&self, name: &str) -> Option<i32> {
        self.thing_aliases.get(name).copied()
    }

    /// Every thing alias, sorted case-insensitively
    pub fn thing_aliases(&self) -> Vec<String> {
        self.thing_aliases.names()
    }

    /// Bind a name to a weapon slot
    pub fn set_weapon_alias(&mut self, name: &str, index: i32) -> Result<()> {
        self.check_index_range(EntityKind::Weapon, index, self.weapon_count())?;
        self.weapon_aliases.insert(name, index);
        Ok(())
    }

    /// Weapon slot bound to a name
    pub fn weapon_alias(&self, name: &str) -> Option<i32> {
        self.weapon_aliases.get(name).copied()
    }

    /// Every weapon alias, sorted case-insensitively
    pub fn weapon_aliases(&self) -> Vec<String> {
        self.weapon_aliases.names()
    }

    /// Bind a name to an ammo slot
    pub fn set_ammo_alias(&mut self, name: &str, index: i32) -> Result<()> {
        self.check_index_range(EntityKind::Ammo, index, self.ammo_count())?;
        self.ammo_aliases.insert(name, index);
        Ok(())
    }

    /// Ammo slot bound to a name
    pub fn ammo_alias(&self, name: &str) -> Option<i32> {
        self.ammo_aliases.get(name).copied()
    }

    /// Every ammo alias, sorted case-insensitively
    pub fn ammo_aliases(&self) -> Vec<String> {
        self.ammo_aliases.names()
    }

    /// Create a blank thing template, replacing any of the same name
    pub fn create_thing_template(&mut self, name: &str) -> &mut DehThing {
        fresh(&mut self.thing_templates, name)
    }

    /// Thing template by name
    pub fn thing_template(&self, name: &str) -> Option<&DehThing> {
        self.thing_templates.get(name)
    }

    /// Thing template by name, for editing
    pub fn thing_template_mut(&mut self, name: &str) -> Option<&mut DehThing> {
        self.thing_templates.get_mut(name)
    }

    /// Create a blank weapon template, replacing any of the same name
    pub fn create_weapon_template(&mut self, name: &str) -> &mut DehWeapon {
        fresh(&mut self.weapon_templates, name)
    }

    /// Weapon template by name
    pub fn weapon_template(&self, name: &str) -> Option<&DehWeapon> {
        self.weapon_templates.get(name)
    }

    /// Weapon template by name, for editing
    pub fn weapon_template_mut(&mut self, name: &str) -> Option<&mut DehWeapon> {
        self.weapon_templates.get_mut(name)
    }

    /// Create a blank ammo template, replacing any of the same name
    pub fn create_ammo_template(&mut self, name: &str) -> &mut DehAmmo {
        fresh(&mut self.ammo_templates, name)
    }

    /// Ammo template by name
    pub fn ammo_template(&self, name: &str) -> Option<&DehAmmo> {
        self.ammo_templates.get(name)
    }

    /// Ammo template by name, for editing
    pub fn ammo_template_mut(&mut self, name: &str) -> Option<&mut DehAmmo> {
        self.ammo_templates.get_mut(name)
    }

    /// Create a blank sound template, replacing any of the same name
    pub fn create_sound_template(&mut self, name: &str) -> &mut DehSound {
        fresh(&mut self.sound_templates, name)
    }

    /// Sound template by name
    pub fn sound_template(&self, name: &str) -> Option<&DehSound> {
        self.sound_templates.get(name)
    }

    /// Sound template by name, for editing
    pub fn sound_template_mut(&mut self, name: &str) -> Option<&mut DehSound> {
        self.sound_templates.get_mut(name)
    }

    /// Bind a global jump label to a state
    pub fn set_global_state(&mut self, name: &str, index: i32) -> Result<()> {
        self.check_index_range(EntityKind::State, index, self.state_count())?;
        self.global_states.insert(name, index);
        Ok(())
    }

    /// State bound to a global label
    pub fn global_state(&self, name: &str) -> Option<i32> {
        self.global_states.get(name).copied()
    }

    /// Every global label, sorted case-insensitively
    pub fn global_state_labels(&self) -> Vec<String> {
        self.global_states.names()
    }

    /// Register a user-defined property for an entity kind (MBF21 and later)
    pub fn add_custom_property(&mut self, kind: EntityKind, property: CustomProperty) -> Result<()> {
        self.require(FeatureLevel::Mbf21, "custom properties")?;
        debug!("Custom {kind} property {}", property.keyword);
        let keyword = property.keyword.clone();
        self.custom_properties
            .entry(kind)
            .or_default()
            .insert(&keyword, property);
        Ok(())
    }

    /// User-defined property by keyword
    pub fn custom_property(&self, kind: EntityKind, keyword: &str) -> Option<&CustomProperty> {
        self.custom_properties.get(&kind)?.get(keyword)
    }

    /// User-defined properties of an entity kind, sorted by keyword
    pub fn custom_properties(&self, kind: EntityKind) -> impl Iterator<Item = &CustomProperty> {
        self.custom_properties
            .get(&kind)
            .into_iter()
            .flat_map(|map| map.values())
    }

    /// Register a user-defined flag mnemonic (MBF21 and later)
    pub fn add_custom_bitflag(&mut self, kind: EntityKind, flag: CustomBitflag) -> Result<()> {
        self.require(FeatureLevel::Mbf21, "custom flags")?;
        let mnemonic = flag.mnemonic.clone();
        self.custom_bitflags
            .entry(kind)
            .or_default()
            .insert(&mnemonic, flag);
        Ok(())
    }

    /// User-defined flag by mnemonic
    pub fn custom_bitflag(&self, kind: EntityKind, mnemonic: &str) -> Option<&CustomBitflag> {
        self.custom_bitflags.get(&kind)?.get(mnemonic)
    }

    /// User-defined flags of an entity kind, sorted by mnemonic
    pub fn custom_bitflags(&self, kind: EntityKind) -> impl Iterator<Item = &CustomBitflag> {
        self.custom_bitflags
            .get(&kind)
            .into_iter()
            .flat_map(|map| map.values())
    }

    /// Register a custom action pointer by mnemonic
    ///
    /// The pointer shadows a baseline pointer of the same mnemonic.
    pub fn add_action_pointer(&mut self, pointer: DehActionPointer) -> Result<Arc<DehActionPointer>> {
        if !self.supports_pointer_type(pointer.kind) {
            return Err(Error::unsupported(
                self.dialect.to_string(),
                format!("{} pointer {}", pointer.kind, pointer.mnemonic),
            ));
        }
        let pointer = Arc::new(pointer);
        self.pointer_mnemonics
            .insert(&pointer.mnemonic, Arc::clone(&pointer));
        Ok(pointer)
    }

    /// Action pointer by mnemonic: custom pointers first, then the baseline
    ///
    /// Baseline pointers beyond the dialect's vocabulary are not returned.
    pub fn action_pointer_by_mnemonic(&self, mnemonic: &str) -> Option<Arc<DehActionPointer>> {
        self.pointer_mnemonics
            .get(mnemonic)
            .cloned()
            .or_else(|| self.baseline.action_pointer_by_mnemonic(mnemonic))
            .filter(|pointer| self.supports_pointer_type(pointer.kind))
    }
}

fn fresh<'a, T: Default>(templates: &'a mut NameMap<T>, name: &str) -> &'a mut T {
    debug!("Created template {name}");
    templates.put(name, T::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::SourcePatch;
    use crate::context::ContextOptions;
    use crate::dialect::Dialect;
    use crate::entity::{DehState, ValueType};
    use crate::feature::ActionPointerType;

    fn context(dialect: Dialect) -> PatchContext {
        let patch = SourcePatch::builder("t")
            .thing(DehThing::named("Player"))
            .thing(DehThing::named("Imp"))
            .state(DehState::new(0, 0, false, 0, -1), None)
            .state(DehState::new(0, 0, false, 1, -1), Some("Light0"))
            .action_pointer(DehActionPointer::new("Light0", ActionPointerType::Doom19, true, -1))
            .action_pointer(DehActionPointer::new("Jump", ActionPointerType::Mbf21, false, -1))
            .build()
            .unwrap();
        PatchContext::new(dialect, Arc::new(patch), ContextOptions::default())
    }

    #[test]
    fn test_aliases_case_insensitive() {
        let mut ctx = context(Dialect::Boom);
        ctx.set_thing_alias("DoomImp", 1).unwrap();
        ctx.set_thing_alias("player", 0).unwrap();
        assert_eq!(ctx.thing_alias("DOOMIMP"), Some(1));
        assert_eq!(ctx.thing_aliases(), vec!["DoomImp", "player"]);
        assert!(matches!(
            ctx.set_thing_alias("ghost", 2),
            Err(Error::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_templates_are_unbound() {
        let mut ctx = context(Dialect::Boom);
        ctx.create_thing_template("Base").health = 500;
        assert_eq!(ctx.thing_template("base").unwrap().health, 500);
        assert_eq!(ctx.used_thing_indices().count(), 0);
        ctx.create_thing_template("BASE");
        assert_eq!(ctx.thing_template("base").unwrap().health, DehThing::default().health);
    }

    #[test]
    fn test_custom_properties_gated() {
        let prop = CustomProperty::new("gibhealth", "Gib health", ValueType::Int);
        let mut boom = context(Dialect::Boom);
        assert!(matches!(
            boom.add_custom_property(EntityKind::Thing, prop.clone()),
            Err(Error::Unsupported { .. })
        ));

        let mut mbf21 = context(Dialect::Mbf21);
        mbf21.add_custom_property(EntityKind::Thing, prop).unwrap();
        assert!(mbf21.custom_property(EntityKind::Thing, "GIBHEALTH").is_some());
        assert!(mbf21.custom_property(EntityKind::Weapon, "gibhealth").is_none());
        assert_eq!(mbf21.custom_properties(EntityKind::Thing).count(), 1);
    }

    #[test]
    fn test_pointer_lookup_respects_vocabulary() {
        let mut ctx = context(Dialect::Boom);
        assert!(ctx.action_pointer_by_mnemonic("light0").is_some());
        assert!(ctx.action_pointer_by_mnemonic("Jump").is_none());

        let custom = DehActionPointer::new("Light0", ActionPointerType::Doom19, true, 1);
        ctx.add_action_pointer(custom).unwrap();
        assert_eq!(ctx.action_pointer_by_mnemonic("LIGHT0").unwrap().frame, 1);
    }

    #[test]
    fn test_global_states() {
        let mut ctx = context(Dialect::Mbf);
        ctx.set_global_state("Gone", 0).unwrap();
        assert_eq!(ctx.global_state("gone"), Some(0));
        assert_eq!(ctx.global_state_labels(), vec!["Gone"]);
    }
}
