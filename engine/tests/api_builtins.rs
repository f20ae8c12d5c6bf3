use engine::api::{order_encounter, roll_many, turn_order, RollConfig, TurnOrderConfig};
use engine::content::builtin_encounters;
use engine::encounter::Encounter;
use engine::RollStrategy;

fn builtin(id: &str) -> TurnOrderConfig {
    TurnOrderConfig {
        encounter_id: Some(id.into()),
        encounter_path: None,
        initiative_strategy: None,
        hit_point_strategy: None,
        seed: 2025,
        max_rerolls: 100,
    }
}

#[test]
fn every_builtin_encounter_parses() {
    for (id, text) in builtin_encounters() {
        let enc: Encounter = serde_json::from_str(text).unwrap_or_else(|e| panic!("{id}: {e}"));
        assert!(!enc.entities.is_empty(), "{id} has no entities");
    }
}

#[test]
fn goblin_ambush_with_average_initiative() {
    let cfg = TurnOrderConfig { initiative_strategy: Some(RollStrategy::Average), ..builtin("goblin_ambush") };
    let res = turn_order(cfg).unwrap();
    insta::assert_snapshot!(res.order.join("\n"), @r"
    Start of round (round)
    Reinforcements arrive (reminder, init 20)
    Ayla (player, init 15)
    Goblin Archer (monster, init 15)
    Goblin Boss (monster, init 13)
    Bram (player, init 9)
    End of round (round)
    ");
    assert!(res.log.iter().any(|l| l == "[INIT][Goblin Boss] 1d20+2 (average) → 13"));
}

#[test]
fn unrolled_monsters_sort_as_zero() {
    let res = turn_order(builtin("goblin_ambush")).unwrap();
    assert_eq!(res.order[5], "Goblin Boss (monster, init -)");
    assert!(res.log.iter().all(|l| !l.starts_with("[INIT]")));
}

#[test]
fn lair_of_the_ogre_rolls_hit_points() {
    let cfg = TurnOrderConfig {
        initiative_strategy: Some(RollStrategy::Average),
        hit_point_strategy: Some(RollStrategy::Average),
        ..builtin("lair_of_the_ogre")
    };
    let res = turn_order(cfg).unwrap();
    assert_eq!(
        res.order,
        [
            "Torches gutter (round)",
            "Lair action (reminder, init 20)",
            "Cyd (player, init 12)",
            "Ogre (monster, init 10)",
        ]
    );
    let ogre = res.encounter.clone().monsters_mut().next().map(|m| (m.current_hp, m.max_hp));
    assert_eq!(ogre, Some((60, 60)));
}

#[test]
fn unknown_builtin_is_an_error() {
    let err = turn_order(builtin("dragon_hoard")).unwrap_err();
    assert!(err.to_string().contains("dragon_hoard"));
}

#[test]
fn missing_source_is_an_error() {
    let cfg = TurnOrderConfig { encounter_id: None, ..builtin("goblin_ambush") };
    assert!(turn_order(cfg).is_err());
}

#[test]
fn roll_summary_of_fixed_strategy() {
    let cfg = RollConfig {
        notation: "2d6+1".into(),
        strategy: RollStrategy::Maximum,
        samples: 4,
        seed: 1,
        max_rerolls: 100,
    };
    let summary = roll_many(cfg).unwrap();
    assert_eq!(summary.rolls, [13, 13, 13, 13]);
    assert_eq!((summary.min, summary.max), (13, 13));
    assert_eq!(summary.mean, 13.0);
    assert_eq!(summary.theoretical_average, 8);
    assert_eq!(summary.log[0], "[ROLL] #1 2d6+1 (maximum) = 13");
}

#[test]
fn roll_summary_statistics_are_consistent() {
    let cfg = RollConfig {
        notation: "3d8".into(),
        strategy: RollStrategy::Random,
        samples: 200,
        seed: 77,
        max_rerolls: 100,
    };
    let summary = roll_many(cfg).unwrap();
    assert_eq!(summary.rolls.len(), 200);
    assert!(summary.min >= 3 && summary.max <= 24);
    assert!(summary.mean >= summary.min as f64 && summary.mean <= summary.max as f64);
    assert!(summary.median >= summary.min as f64 && summary.median <= summary.max as f64);
}

#[test]
fn roll_summary_rejects_bad_requests() {
    let zero = RollConfig {
        notation: "1d6".into(),
        strategy: RollStrategy::Random,
        samples: 0,
        seed: 0,
        max_rerolls: 100,
    };
    assert!(roll_many(zero).is_err());

    let bad: RollConfig = serde_json::from_str(r#"{"notation":"six dice"}"#).unwrap();
    let err = roll_many(bad).unwrap_err();
    assert!(format!("{:#}", err).contains("six dice"));
}

#[test]
fn reroll_bound_reaches_monster_rolls() {
    let cfg = TurnOrderConfig {
        initiative_strategy: Some(RollStrategy::High),
        hit_point_strategy: Some(RollStrategy::Low),
        max_rerolls: 0,
        ..builtin("goblin_ambush")
    };
    let res = turn_order(cfg).unwrap();
    assert!(res.log.contains(&"[HP][Goblin Boss] 6d6 (low) → 6".to_string()));
    assert!(res.log.contains(&"[INIT][Goblin Boss] 1d20+2 (high) → 22".to_string()));
}

#[test]
fn unusable_initiative_bonus_fails_before_rolling() {
    let enc: Encounter = serde_json::from_str(
        r#"{"name":"Broken","entities":[
            {"type":"monster","name":"Imp","initiative_bonus":1},
            {"type":"monster","name":"Glitch","initiative_bonus":2147483647}
        ]}"#,
    )
    .unwrap();
    let cfg = TurnOrderConfig { initiative_strategy: Some(RollStrategy::Average), ..builtin("unused") };
    let err = order_encounter(enc, &cfg).unwrap_err();
    assert!(err.to_string().contains("Glitch"), "{err}");
}
