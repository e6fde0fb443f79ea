use common::{RoundEndReason, WeaponClass};

// https://github.com/markus-wa/demoinfocs-golang/blob/205b0bb25e9f3e96e1d306d154199b4a6292940e/pkg/demoinfocs/events/events.go#L53
pub static ROUND_WIN_REASON: phf::Map<i32, RoundEndReason> = phf::phf_map! {
    0_i32 => RoundEndReason::StillInProgress,
    1_i32 => RoundEndReason::BombExploded,
    2_i32 => RoundEndReason::VipEscaped,
    3_i32 => RoundEndReason::VipKilled,
    4_i32 => RoundEndReason::TSaved,
    5_i32 => RoundEndReason::CtStoppedEscape,
    6_i32 => RoundEndReason::RoundEndReasonTerroristsStopped,
    7_i32 => RoundEndReason::BombDefused,
    8_i32 => RoundEndReason::TKilled,
    9_i32 => RoundEndReason::CTKilled,
    10_i32 => RoundEndReason::Draw,
    11_i32 => RoundEndReason::HostageRescued,
    12_i32 => RoundEndReason::TimeRanOut,
    13_i32 => RoundEndReason::RoundEndReasonHostagesNotRescued,
    14_i32 => RoundEndReason::TerroristsNotEscaped,
    15_i32 => RoundEndReason::VipNotEscaped,
    16_i32 => RoundEndReason::GameStart,
    17_i32 => RoundEndReason::TSurrender,
    18_i32 => RoundEndReason::CTSurrender,
    19_i32 => RoundEndReason::TPlanted,
    20_i32 => RoundEndReason::CTReachedHostage,
};

pub static WEAPON_CLASSES: phf::Map<&'static str, WeaponClass> = phf::phf_map! {
    "knife" => WeaponClass::Knife,
    "knife_t" => WeaponClass::Knife,
    "bayonet" => WeaponClass::Knife,
    "knifegg" => WeaponClass::Knife,

    "glock" => WeaponClass::Pistol,
    "hkp2000" => WeaponClass::Pistol,
    "usp_silencer" => WeaponClass::Pistol,
    "p250" => WeaponClass::Pistol,
    "elite" => WeaponClass::Pistol,
    "fiveseven" => WeaponClass::Pistol,
    "tec9" => WeaponClass::Pistol,
    "cz75a" => WeaponClass::Pistol,
    "deagle" => WeaponClass::Pistol,
    "revolver" => WeaponClass::Pistol,

    "mac10" => WeaponClass::Smg,
    "mp9" => WeaponClass::Smg,
    "mp7" => WeaponClass::Smg,
    "mp5sd" => WeaponClass::Smg,
    "ump45" => WeaponClass::Smg,
    "p90" => WeaponClass::Smg,
    "bizon" => WeaponClass::Smg,

    "galilar" => WeaponClass::Rifle,
    "famas" => WeaponClass::Rifle,
    "ak47" => WeaponClass::Rifle,
    "m4a1" => WeaponClass::Rifle,
    "m4a1_silencer" => WeaponClass::Rifle,
    "sg556" => WeaponClass::Rifle,
    "aug" => WeaponClass::Rifle,

    "ssg08" => WeaponClass::Sniper,
    "awp" => WeaponClass::Sniper,
    "g3sg1" => WeaponClass::Sniper,
    "scar20" => WeaponClass::Sniper,

    "nova" => WeaponClass::Shotgun,
    "xm1014" => WeaponClass::Shotgun,
    "sawedoff" => WeaponClass::Shotgun,
    "mag7" => WeaponClass::Shotgun,

    "m249" => WeaponClass::MachineGun,
    "negev" => WeaponClass::MachineGun,

    "hegrenade" => WeaponClass::Grenade,
    "flashbang" => WeaponClass::Grenade,
    "smokegrenade" => WeaponClass::Grenade,
    "molotov" => WeaponClass::Grenade,
    "incgrenade" => WeaponClass::Grenade,
    "inferno" => WeaponClass::Grenade,
    "decoy" => WeaponClass::Grenade,

    "taser" => WeaponClass::Equipment,
    "vest" => WeaponClass::Equipment,
    "vesthelm" => WeaponClass::Equipment,
    "defuser" => WeaponClass::Equipment,
    "c4" => WeaponClass::Equipment,

    "world" => WeaponClass::World,
    "worldent" => WeaponClass::World,
    "trigger_hurt" => WeaponClass::World,
    "planted_c4" => WeaponClass::World,
};

pub static ITEM_PRICES: phf::Map<&'static str, u32> = phf::phf_map! {
    "glock" => 200,
    "hkp2000" => 200,
    "usp_silencer" => 200,
    "p250" => 300,
    "elite" => 300,
    "fiveseven" => 500,
    "tec9" => 500,
    "cz75a" => 500,
    "deagle" => 700,
    "revolver" => 600,
    "mac10" => 1050,
    "mp9" => 1250,
    "mp7" => 1500,
    "mp5sd" => 1500,
    "ump45" => 1200,
    "p90" => 2350,
    "bizon" => 1400,
    "galilar" => 1800,
    "famas" => 2050,
    "ak47" => 2700,
    "m4a1" => 3100,
    "m4a1_silencer" => 2900,
    "sg556" => 3000,
    "aug" => 3300,
    "ssg08" => 1700,
    "awp" => 4750,
    "g3sg1" => 5000,
    "scar20" => 5000,
    "nova" => 1050,
    "xm1014" => 2000,
    "sawedoff" => 1100,
    "mag7" => 1300,
    "m249" => 5200,
    "negev" => 1700,
    "hegrenade" => 300,
    "flashbang" => 200,
    "smokegrenade" => 300,
    "molotov" => 400,
    "incgrenade" => 500,
    "decoy" => 50,
    "taser" => 200,
    "vest" => 650,
    "vesthelm" => 1000,
    "defuser" => 400,
};

fn normalize(name: &str) -> &str {
    name.trim_start_matches("weapon_").trim_start_matches("item_")
}

pub fn weapon_class(weapon: Option<&str>) -> WeaponClass {
    let name = match weapon {
        Some(w) => normalize(w),
        None => return WeaponClass::Unknown,
    };

    if let Some(class) = WEAPON_CLASSES.get(name) {
        return *class;
    }

    // Skins ship with their own names, all of them are knives.
    if name.starts_with("knife") {
        return WeaponClass::Knife;
    }

    WeaponClass::Unknown
}

pub fn item_price(item: &str) -> Option<u32> {
    ITEM_PRICES.get(normalize(item)).copied()
}

pub fn round_end_reason(code: i32) -> Option<RoundEndReason> {
    ROUND_WIN_REASON.get(&code).cloned()
}
