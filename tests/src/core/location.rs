use std::collections::HashMap;

use armjit_core::{ArmReg, Cond, LocationDescriptor, SignExtendRotation};

#[test]
fn cond_from_bits_roundtrip() {
    for bits in 0..16u32 {
        assert_eq!(Cond::from_bits(bits) as u32, bits);
    }
    // Only the low nibble participates.
    assert_eq!(Cond::from_bits(0xE0), Cond::EQ);
}

#[test]
fn cond_holds_flag_table() {
    // (n, z, c, v)
    assert!(Cond::EQ.holds(false, true, false, false));
    assert!(!Cond::EQ.holds(false, false, false, false));
    assert!(Cond::NE.holds(false, false, false, false));
    assert!(Cond::CS.holds(false, false, true, false));
    assert!(Cond::CC.holds(false, false, false, false));
    assert!(Cond::MI.holds(true, false, false, false));
    assert!(Cond::PL.holds(false, false, false, false));
    assert!(Cond::HI.holds(false, false, true, false));
    assert!(!Cond::HI.holds(false, true, true, false));
    assert!(Cond::LS.holds(false, true, true, false));
    assert!(Cond::GE.holds(true, false, false, true));
    assert!(Cond::LT.holds(true, false, false, false));
    assert!(Cond::GT.holds(false, false, false, false));
    assert!(!Cond::GT.holds(false, true, false, false));
    assert!(Cond::LE.holds(false, true, false, false));
    assert!(Cond::AL.holds(false, false, false, false));
    // ARMv6 has no "never"; the 0b1111 space is unconditional.
    assert!(Cond::NV.holds(false, false, false, false));
}

#[test]
fn descriptor_identity_covers_all_fields() {
    let base = LocationDescriptor::new(0x100, false, false);
    assert_eq!(base, LocationDescriptor::new(0x100, false, false));
    assert_ne!(base, base.with_arm_pc(0x104));
    assert_ne!(base, base.with_cond(Cond::EQ));
    assert_ne!(base, base.with_e_flag(true));
    assert_ne!(
        base,
        LocationDescriptor {
            t_flag: true,
            ..base
        }
    );
}

#[test]
fn descriptor_is_a_map_key() {
    let mut cache: HashMap<LocationDescriptor, u32> = HashMap::new();
    let a = LocationDescriptor::new(0, false, false);
    let b = a.with_cond(Cond::EQ);
    cache.insert(a, 1);
    cache.insert(b, 2);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache[&a], 1);
    assert_eq!(cache[&b], 2);
}

#[test]
fn default_residual_condition_is_al() {
    assert_eq!(LocationDescriptor::new(0, false, false).cond, Cond::AL);
}

#[test]
fn register_constants() {
    assert_eq!(ArmReg::SP.index(), 13);
    assert_eq!(ArmReg::LR.index(), 14);
    assert_eq!(ArmReg::PC.index(), 15);
    assert_eq!(ArmReg::new(7).index(), 7);
}

#[test]
#[should_panic]
fn register_index_out_of_range() {
    ArmReg::new(16);
}

#[test]
fn sign_extend_rotation_amounts() {
    assert_eq!(SignExtendRotation::from_bits(0).amount(), 0);
    assert_eq!(SignExtendRotation::from_bits(1).amount(), 8);
    assert_eq!(SignExtendRotation::from_bits(2).amount(), 16);
    assert_eq!(SignExtendRotation::from_bits(3).amount(), 24);
}
