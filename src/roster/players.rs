//! Built-in name lists.
//!
//! Include common nicknames and alternate spellings as separate entries;
//! matching is literal, so "Squishy" and "SquishyMuffinz" are both needed.

/// Pro players and notable community figures
pub const CURATED_PLAYERS: &[&str] = &[
    // NA
    "Firstkiller", "First", "Squishy", "SquishyMuffinz", "Garrett", "GarrettG",
    "jstn", "Justin", "Arsenal", "Mist", "Daniel", "Beastmode", "Dreaz", "Comm",
    "Retals", "Torment", "Rapid", "Lionblaze", "Percy", "Roll Dizz", "Chrome",
    "Memory", "Allushin", "Majicbear", "Chronic", "Aqua", "Oath", "Gyro", "Fig",
    // EU
    "Zen", "Vatira", "Joyo", "Monkey Moon", "Kaydop", "Fairy Peak", "Alpha54",
    "Seikoo", "Aztral", "AppJack", "Archie", "Kash", "Joreuz", "Scrub Killa",
    "Scrub", "Exotiik", "Atow", "Rizex", "Noly", "RelatingWave", "Radosin",
    "Itachi", "Catalysm", "Crr", "rise", "Kassio", "Acronik", "arju", "Oaly",
    "Yukeo",
    // OCE
    "Bananahead", "Torsos", "CJCJ", "Drippay", "Fever", "Express", "Amphis",
    "Decka", "Le Duck", "Superlachie",
    // SAM
    "Yanxnz", "Lostt", "Caard", "AztromicK", "Reysbull", "Kv1", "Math", "Taco",
    "Drufinho", "nxghtt",
    // MENA
    "Ahmad", "oKhaliD", "trk511", "Senzo", "ams", "Twiz", "Kiileerrz",
    // APAC
    "Maru", "ReaLize", "Tenhow", "Burn", "LCT",
    // SSA
    "Snowyy", "SkillSteal",
    // Creators and coaches
    "Sizz", "Rizzo", "Leth", "Lethamyr", "SunlessKhan", "Sunless", "Musty",
    "Flakes", "Kronovi", "Turbopolsa", "Turbo", "Gibbs", "Jorby", "Achieves",
    "Wavepunk", "Lawler", "Stumpy", "Johnny", "JohnnyBoi", "Dazerin", "Turtle",
    "Corelli", "Gregan",
];

/// Used when the user roster file is missing
pub const EXAMPLE_FRIENDS: &[&str] = &["Larry", "Hammy Crackers", "Hammy", "Jett"];
