use std::collections::HashMap;

pub fn builtin_encounters() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("goblin_ambush", include_str!("../content/encounters/goblin_ambush.json")),
        ("lair_of_the_ogre", include_str!("../content/encounters/lair_of_the_ogre.json")),
    ])
}
