//! Seeded style cards for the editor brief.
//!
//! Strategy and material draws use their own [`StdRng`] streams, so the same
//! seed always yields the same cards on every platform.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Offset applied to the seed for the material stream, keeping it
/// independent of the strategy draw.
const MATERIAL_SEED_OFFSET: u64 = 101;

/// Narrative dials suggested for one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub opening: &'static str,
    pub rhythm: &'static str,
    pub camera: &'static str,
    pub dialogue_density: &'static str,
}

pub const STRATEGIES: [Strategy; 4] = [
    Strategy {
        opening: "Open on dialogue",
        rhythm: "Mostly short sentences, cut clean",
        camera: "Close-up (hands, objects, small movements)",
        dialogue_density: "Dialogue-heavy",
    },
    Strategy {
        opening: "Open on an action",
        rhythm: "Mix of short and medium sentences",
        camera: "Medium shot (two people, blocking, distance)",
        dialogue_density: "Moderate dialogue",
    },
    Strategy {
        opening: "Open on ambient sound",
        rhythm: "Longer sentences; one or two rambling passages allowed",
        camera: "Wide establishing shot (city, weather, street lights)",
        dialogue_density: "Sparse dialogue, but every line lands",
    },
    Strategy {
        opening: "Open on an object",
        rhythm: "Short sentences with the odd long one to set the pace",
        camera: "Push in from medium to close",
        dialogue_density: "Moderate dialogue",
    },
];

/// Filler words the brief asks the writer to use sparingly.
pub const BANNED_FILLERS: [&str; 8] = [
    "meanwhile",
    "couldn't help but",
    "clearly",
    "as if",
    "destined",
    "undoubtedly",
    "in this moment",
    "slowly",
];

/// Light-touch prohibitions listed in every brief.
pub const EDITOR_DONTS: [&str; 3] = [
    "Don't close paragraphs with a life lesson; let events speak.",
    "Go easy on filler and stock transitions; show it with action or dialogue instead of explaining.",
    "Don't make every paragraph tidy (same length, same rhythm, same sentence shape).",
];

const OBJECTS: [&str; 10] = [
    "a crumpled cigarette pack",
    "a ring of keys",
    "a worn phone case",
    "leather gloves",
    "a disposable lighter",
    "steamed buns in a plastic bag",
    "a till receipt",
    "car keys",
    "a yellowed business card",
    "a snapped toothpick",
];

const SOUNDS: [&str; 7] = [
    "a dog barking somewhere",
    "the radiator ticking",
    "footsteps in the corridor",
    "the chime over a glass door",
    "cash register keys",
    "the dull thud of a car door",
    "the hum of a lift",
];

const SENSES: [&str; 5] = [
    "cold air slipping under the collar",
    "smoke clinging to clothes",
    "fingers numb with cold",
    "a damp smell in the room",
    "warm air on the face, gone at once",
];

const GESTURES: [&str; 8] = [
    "taps a cigarette on the pack",
    "drums two fingers on the table",
    "looks up and away again",
    "tugs a sleeve up",
    "pats a pocket without thinking",
    "swallows",
    "laughs in a way that isn't quite a laugh",
    "scrapes the chair back with a screech",
];

const PLACE_DETAILS: [&str; 6] = [
    "the heavy curtain at a bathhouse door",
    "a lottery kiosk's lightbox on the corner",
    "flyers stuck in an old stairwell",
    "blue-white lights at a service station",
    "night-market grease smoke and plastic stools",
    "a bus stop sign with peeling paint",
];

const DIALOGUE_SEEDS: [&str; 8] = [
    "Spare me the speeches.",
    "Fine. So what do you want to do now?",
    "I'm giving you face. Doesn't mean I'm scared of you.",
    "Say it straight. Stop circling.",
    "Believe it or don't, but I've said my piece.",
    "Quit pretending. You know exactly what this is.",
    "I don't owe you, and I'm not afraid of you either.",
    "Did you come here to talk, or to make a scene?",
];

/// Concrete detail cards drawn for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materials {
    pub objects: Vec<&'static str>,
    pub sounds: Vec<&'static str>,
    pub sense: &'static str,
    pub gestures: Vec<&'static str>,
    pub place_details: Vec<&'static str>,
    pub dialogue_seeds: Vec<&'static str>,
}

#[must_use]
pub fn choose_strategy(seed: u64) -> Strategy {
    let mut rng = StdRng::seed_from_u64(seed);
    STRATEGIES
        .choose(&mut rng)
        .copied()
        .unwrap_or(STRATEGIES[0])
}

#[must_use]
pub fn sample_materials(seed: u64) -> Materials {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(MATERIAL_SEED_OFFSET));
    let mut draw = |deck: &[&'static str], k: usize| -> Vec<&'static str> {
        deck.choose_multiple(&mut rng, k.min(deck.len()))
            .copied()
            .collect()
    };

    let objects = draw(&OBJECTS, 3);
    let sounds = draw(&SOUNDS, 2);
    let sense = draw(&SENSES, 1).first().copied().unwrap_or(SENSES[0]);
    let gestures = draw(&GESTURES, 2);
    let place_details = draw(&PLACE_DETAILS, 2);
    let dialogue_seeds = draw(&DIALOGUE_SEEDS, 6);

    Materials {
        objects,
        sounds,
        sense,
        gestures,
        place_details,
        dialogue_seeds,
    }
}
