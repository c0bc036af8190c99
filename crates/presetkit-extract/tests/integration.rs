//! Integration tests for presetkit-extract.
//!
//! Extracts a complete parameter header fixture and checks enum layout,
//! group expansion and GUID extraction, plus property tests for group sizes.

use presetkit_core::{DefaultValue, WireType};
use presetkit_extract::{ExtractError, SchemaExtractor, extract_processor_uid};
use proptest::prelude::*;

const PARAMETER_HPP: &str = include_str!("fixtures/MiniVerb/source/parameter.hpp");
const FUID_HPP: &str = include_str!("fixtures/MiniVerb/source/fuid.hpp");

// ---------------------------------------------------------------------------
// Fixture header
// ---------------------------------------------------------------------------

#[test]
fn fixture_identifier_table() {
    let table = SchemaExtractor::new().identifier_table(PARAMETER_HPP).unwrap();
    let layout: Vec<_> = table
        .entries()
        .iter()
        .map(|e| (e.name.as_str(), e.index, e.range))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("bypass", 0, Some(1)),
            ("tapTime0", 1, Some(4)),
            ("tapFeed0", 5, Some(4)),
            ("stageGain0", 9, Some(2)),
            ("mix", 11, Some(1)),
            ("outputGain", 12, Some(1)),
            ("seed", 13, Some(1)),
        ]
    );
    assert_eq!(table.sentinel_index(), Some(14));
}

#[test]
fn fixture_schema() {
    let schema = SchemaExtractor::new().extract(PARAMETER_HPP).unwrap();
    assert_eq!(schema.plugin(), "MiniVerb");

    let names: Vec<_> = schema.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "bypass",
            "tapTime0",
            "tapTime1",
            "tapTime2",
            "tapTime3",
            "tapFeed0",
            "tapFeed1",
            "tapFeed2",
            "tapFeed3",
            "stageGain0",
            "stageGain1",
            "mix",
            "outputGain",
            "seed",
        ]
    );
    for (expected, descriptor) in schema.iter().enumerate() {
        assert_eq!(descriptor.id as usize, expected);
    }
    assert_eq!(schema.total_width(), 104);
}

#[test]
fn fixture_descriptor_details() {
    let schema = SchemaExtractor::new().extract(PARAMETER_HPP).unwrap();

    let bypass = schema.find("bypass").unwrap();
    assert_eq!(bypass.wire_type, WireType::UInt32);
    assert_eq!(bypass.default, DefaultValue::Integer(0));
    assert_eq!(bypass.scale, "Scales::boolScale");
    assert_eq!(bypass.flags, "Info::kCanAutomate | Info::kIsBypass");

    let tap = schema.find("tapTime2").unwrap();
    assert_eq!(tap.wire_type, WireType::Float64);
    assert_eq!(
        tap.default,
        DefaultValue::Expression("Scales::time.invmap(0.1 * (2 + 1))".into())
    );

    let stage = schema.find("stageGain1").unwrap();
    assert_eq!(
        stage.default,
        DefaultValue::Expression("Scales::gain.invmap(1.0 / (1 + 1))".into())
    );

    assert_eq!(schema.find("tapFeed3").unwrap().default, DefaultValue::Float(0.5));
    assert_eq!(schema.find("seed").unwrap().default, DefaultValue::Integer(11467));
    assert!(schema.iter().all(|d| !d.default_tolerant));
}

#[test]
fn fixture_processor_uid() {
    assert_eq!(
        extract_processor_uid(FUID_HPP).as_deref(),
        Some("8A1F03C25B7E4D909C26E1F40D3B7A65")
    );
    assert_eq!(extract_processor_uid(PARAMETER_HPP), None);
}

#[test]
fn misspelled_reference_in_fixture_fails_closed() {
    let broken = PARAMETER_HPP.replace("value[ID::mix]", "value[ID::mxi]");
    match SchemaExtractor::new().extract(&broken).unwrap_err() {
        ExtractError::UnresolvedParameterReference { name, line } => {
            assert_eq!(name, "mxi");
            assert!(line > 1);
        }
        other => panic!("expected UnresolvedParameterReference, got {other:?}"),
    }
}

#[test]
fn missing_constant_in_fixture() {
    let broken = PARAMETER_HPP.replace("constexpr uint16_t nStage = 2;", "");
    let err = SchemaExtractor::new().extract(&broken).unwrap_err();
    assert!(matches!(err, ExtractError::UnresolvedConstant { ref term, .. } if term == "nStage"));

    let schema = SchemaExtractor::new()
        .with_constant("nStage", 2)
        .extract(&broken)
        .unwrap();
    assert_eq!(schema.len(), 14);
}

#[test]
fn header_without_enum_is_schema_not_found() {
    let err = SchemaExtractor::new().extract(FUID_HPP).unwrap_err();
    assert!(matches!(err, ExtractError::SchemaNotFound { .. }));
}

// ---------------------------------------------------------------------------
// Group expansion properties
// ---------------------------------------------------------------------------

fn grouped_source(sizes: &[u32], kinds: &[bool]) -> String {
    let mut enum_body = String::new();
    let mut constructions = String::new();
    let mut next = 0u32;
    for (g, (&size, &uint)) in sizes.iter().zip(kinds).enumerate() {
        enum_body.push_str(&format!("  group{g}x0 = {next},\n"));
        let kind = if uint { "UIntValue" } else { "LinearValue" };
        constructions.push_str(&format!(
            "for (size_t idx = 0; idx < {size}; ++idx) {{\n  \
             value[ID::group{g}x0 + idx] = std::make_unique<{kind}>(idx, s, \"g\", f);\n}}\n"
        ));
        next += size;
    }
    format!(
        "// This file is part of Prop.\nnamespace ParameterID {{\nenum ID {{\n{enum_body}  ID_ENUM_LENGTH = {next},\n}};\n}}\n{constructions}"
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A group with range K expands to K consecutive descriptors
    /// `base0..base(K-1)` sharing one wire type.
    #[test]
    fn groups_expand_to_their_range(
        groups in prop::collection::vec((1u32..24, any::<bool>()), 1..6)
    ) {
        let sizes: Vec<u32> = groups.iter().map(|g| g.0).collect();
        let kinds: Vec<bool> = groups.iter().map(|g| g.1).collect();
        let schema = SchemaExtractor::new().extract(&grouped_source(&sizes, &kinds)).unwrap();

        prop_assert_eq!(schema.len() as u32, sizes.iter().sum::<u32>());

        let mut id = 0u32;
        for (g, (&size, &uint)) in sizes.iter().zip(&kinds).enumerate() {
            let wire = if uint { WireType::UInt32 } else { WireType::Float64 };
            for member in 0..size {
                let d = schema.get(id).unwrap();
                prop_assert_eq!(&d.name, &format!("group{g}x{member}"));
                prop_assert_eq!(d.wire_type, wire);
                prop_assert_eq!(&d.default, &DefaultValue::Integer(i64::from(member)));
                id += 1;
            }
        }
    }
}
