//! Property-Based Tests for raidgrow
//!
//! Uses proptest for testing invariants and edge cases:
//! - Enum string round-trips (parse → to_string → parse)
//! - Layout resolution grammar
//! - Status-line parsing
//! - Rebuild member ordering for create and extend

mod common;

use common::{FakeProbe, ScriptedExecutor};
use proptest::prelude::*;
use raidgrow::engine::workflow::OrchestrationEngine;
use raidgrow::layout;
use raidgrow::topology::parse_status;
use raidgrow::types::{Mode, Raid10Placement, Raid5Layout, RaidLevel};
use raidgrow::Configuration;
use std::path::PathBuf;

// =============================================================================
// Enum Property Tests
// =============================================================================

fn level_strategy() -> impl Strategy<Value = RaidLevel> {
    prop_oneof![
        Just(RaidLevel::Raid0),
        Just(RaidLevel::Raid1),
        Just(RaidLevel::Raid5),
        Just(RaidLevel::Raid10),
    ]
}

fn mode_strategy() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Create), Just(Mode::Extend), Just(Mode::Remove)]
}

proptest! {
    /// RaidLevel: to_string → parse round-trip is identity
    #[test]
    fn level_roundtrip(level in level_strategy()) {
        let parsed: RaidLevel = level.to_string().parse().expect("Should parse");
        prop_assert_eq!(level, parsed);
        let prefixed: RaidLevel = format!("raid{}", level).parse().expect("Should parse");
        prop_assert_eq!(level, prefixed);
    }

    /// Mode: Display output is lowercase and parses back
    #[test]
    fn mode_roundtrip(mode in mode_strategy()) {
        let s = mode.to_string();
        prop_assert_eq!(s.clone(), s.to_lowercase());
        let parsed: Mode = s.parse().expect("Should parse");
        prop_assert_eq!(mode, parsed);
    }

    /// Only 0, 1, 5 and 10 are accepted as numeric levels
    #[test]
    fn level_try_from_only_supported(n in any::<u8>()) {
        let supported = matches!(n, 0 | 1 | 5 | 10);
        prop_assert_eq!(RaidLevel::try_from(n).is_ok(), supported);
    }
}

// =============================================================================
// Layout Resolution Property Tests
// =============================================================================

fn placement_strategy() -> impl Strategy<Value = Raid10Placement> {
    prop_oneof![
        Just(Raid10Placement::Near),
        Just(Raid10Placement::Far),
        Just(Raid10Placement::Offset),
    ]
}

fn raid5_layout_strategy() -> impl Strategy<Value = Raid5Layout> {
    prop_oneof![
        Just(Raid5Layout::LeftAsymmetric),
        Just(Raid5Layout::LeftSymmetric),
        Just(Raid5Layout::RightAsymmetric),
        Just(Raid5Layout::RightSymmetric),
    ]
}

proptest! {
    /// RAID10: `<type>=<n>` compresses to first letter + n
    #[test]
    fn raid10_layout_compresses(placement in placement_strategy(), copies in 1u32..64) {
        let raw = format!("{}={}", placement, copies);
        let resolved = layout::resolve(RaidLevel::Raid10, &raw).expect("valid layout");
        prop_assert_eq!(resolved, Some(format!("{}{}", placement.short(), copies)));
    }

    /// RAID5: every named layout resolves to itself
    #[test]
    fn raid5_layout_is_identity(layout_name in raid5_layout_strategy()) {
        let raw = layout_name.to_string();
        let resolved = layout::resolve(RaidLevel::Raid5, &raw).expect("valid layout");
        prop_assert_eq!(resolved, Some(raw));
    }

    /// RAID5: anything outside the four names is rejected
    #[test]
    fn raid5_rejects_unknown(raw in "[a-z-]{1,20}") {
        prop_assume!(raw.parse::<Raid5Layout>().is_err());
        prop_assert!(layout::resolve(RaidLevel::Raid5, &raw).is_err());
    }

    /// Levels 0 and 1 ignore whatever layout is given
    #[test]
    fn mirror_and_stripe_ignore_layout(raw in ".*") {
        prop_assert_eq!(layout::resolve(RaidLevel::Raid0, &raw).expect("no-op"), None);
        prop_assert_eq!(layout::resolve(RaidLevel::Raid1, &raw).expect("no-op"), None);
    }
}

// =============================================================================
// Status Parsing Property Tests
// =============================================================================

/// Distinct partition names, in generated order
fn partitions_strategy(size: std::ops::Range<usize>) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("sd[a-z][1-9]", size)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn status_line(name: &str, level: RaidLevel, members: &[String]) -> String {
    let tokens: Vec<String> = members
        .iter()
        .enumerate()
        .map(|(i, m)| format!("{}[{}]", m, i))
        .collect();
    format!(
        "Personalities : [raid0] [raid1] [raid5] [raid10]\n{} : active raid{} {}\n      1000 blocks\n",
        name,
        level,
        tokens.join(" ")
    )
}

proptest! {
    /// Members come back in reported order; parsing twice gives the same result
    #[test]
    fn status_parse_preserves_order(level in level_strategy(), members in partitions_strategy(1..8)) {
        let text = status_line("md0", level, &members);
        let first = parse_status(&text, "md0").expect("parse");
        let second = parse_status(&text, "md0").expect("parse");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.level, level);
        prop_assert_eq!(first.members, members);
    }

    /// A name that is a prefix of the listed array never matches it
    #[test]
    fn status_parse_requires_exact_name(members in partitions_strategy(1..4)) {
        let text = status_line("md10", RaidLevel::Raid1, &members);
        prop_assert!(parse_status(&text, "md1").is_err());
    }
}

// =============================================================================
// Rebuild Ordering Property Tests
// =============================================================================

fn create_command_members(transcript: &[String]) -> Vec<String> {
    let create = transcript
        .iter()
        .find(|c| c.starts_with("mdadm --create"))
        .expect("create issued");
    create
        .split(' ')
        .filter(|arg| arg.starts_with("/dev/sd"))
        .map(str::to_string)
        .collect()
}

proptest! {
    /// Create builds the array from exactly the configured partitions, in order
    #[test]
    fn create_uses_configured_order(partitions in partitions_strategy(1..8)) {
        let config = Configuration::new(Mode::Create, "vg0")
            .with_partitions(&partitions)
            .simulated(true);
        let mut engine = OrchestrationEngine::new(config, ScriptedExecutor::new(), FakeProbe::default());
        let report = engine.run().expect("create");

        let expected: Vec<String> = partitions.iter().map(|p| format!("/dev/{}", p)).collect();
        prop_assert_eq!(create_command_members(engine.runner().transcript()), expected.clone());
        let members: Vec<PathBuf> = expected.iter().map(PathBuf::from).collect();
        prop_assert_eq!(report.members, members);
    }

    /// Extend rebuilds with old members first, then new partitions, no duplicates
    #[test]
    fn extend_appends_after_old_members(
        all in partitions_strategy(2..10),
        split in any::<prop::sample::Index>(),
    ) {
        let at = 1 + split.index(all.len() - 1);
        let (old, new) = all.split_at(at);

        let probe = FakeProbe::with_status(&status_line("md0", RaidLevel::Raid0, old));
        let config = Configuration::new(Mode::Extend, "vg0")
            .with_array_device("md0")
            .with_partitions(new)
            .with_level(RaidLevel::Raid0);
        let mut engine = OrchestrationEngine::new(config, ScriptedExecutor::new(), probe);
        engine.run().expect("extend");

        let expected: Vec<String> = all.iter().map(|p| format!("/dev/{}", p)).collect();
        let members = create_command_members(engine.runner().transcript());
        let unique: std::collections::HashSet<&String> = members.iter().collect();
        prop_assert_eq!(unique.len(), members.len());
        prop_assert_eq!(members, expected);
    }
}
