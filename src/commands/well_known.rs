//! The `/np` action command (spec §9): osu! clients announce "now playing"
//! over chat as an IRC-CTCP `ACTION` message. Parsing grounded on
//! `original_source/plugins/pp.py`'s `NP_REGEX` and `Mod.np_factory` /
//! `GameMode.np_factory`.

use std::sync::OnceLock;

use regex::Regex;

fn np_action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\x01ACTION is (?:playing|listening to|watching) \[https://osu\.ppy\.sh/(b|s)/(\d+) (.+?)\](?: <(.+?)>)?((?: [+-]\w+)*)(?: \|\w+\|)?( ~Relax~)?\x01$",
        )
        .expect("static pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Standard,
    Taiko,
    CatchTheBeat,
    Mania,
}

impl GameMode {
    pub fn as_u8(self) -> u8 {
        match self {
            GameMode::Standard => 0,
            GameMode::Taiko => 1,
            GameMode::CatchTheBeat => 2,
            GameMode::Mania => 3,
        }
    }

    /// Maps the `<Taiko>`/`<CatchTheBeat>`/`<osu!mania>` tag osu! embeds in
    /// `/np` messages when the mode differs from standard. Anything else
    /// (including no tag) is standard.
    fn from_np_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("Taiko") => GameMode::Taiko,
            Some("CatchTheBeat") => GameMode::CatchTheBeat,
            Some("osu!mania") => GameMode::Mania,
            _ => GameMode::Standard,
        }
    }
}

pub const MOD_NO_FAIL: u32 = 1;
pub const MOD_EASY: u32 = 2;
pub const MOD_HIDDEN: u32 = 8;
pub const MOD_HARD_ROCK: u32 = 16;
pub const MOD_DOUBLE_TIME: u32 = 64;
pub const MOD_RELAX: u32 = 128;
pub const MOD_HALF_TIME: u32 = 256;
pub const MOD_FLASHLIGHT: u32 = 1024;
pub const MOD_SPUN_OUT: u32 = 4096;

/// Combines the whitespace-separated `+Mod`/`-Mod` tokens from a `/np`
/// message into a single bitmask. Unknown tokens contribute `0`, matching
/// `Mod.np_factory`'s `_NP.get(x, Mod.NO_MOD)` fallback.
fn mods_from_np_str(mods_str: &str) -> u32 {
    mods_str
        .split_whitespace()
        .map(|tok| tok.trim_start_matches(['+', '-']))
        .fold(0u32, |acc, name| {
            acc | match name {
                "Easy" => MOD_EASY,
                "NoFail" => MOD_NO_FAIL,
                "Hidden" => MOD_HIDDEN,
                "HardRock" => MOD_HARD_ROCK,
                "Nightcore" | "DoubleTime" => MOD_DOUBLE_TIME,
                "HalfTime" => MOD_HALF_TIME,
                "Flashlight" => MOD_FLASHLIGHT,
                "SpunOut" => MOD_SPUN_OUT,
                _ => 0,
            }
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedNp {
    pub beatmap_id: i64,
    pub game_mode: GameMode,
    pub mods: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NpParseError {
    #[error("message did not match the now-playing action pattern")]
    NoMatch,
    #[error("beatmap sets are not supported, only individual difficulties")]
    SetNotSupported,
}

/// Parses a raw `\x01ACTION is playing [...]\x01` message into a beatmap
/// id, game mode, and mod bitmask.
pub fn parse_np_action(message: &str) -> Result<ParsedNp, NpParseError> {
    let caps = np_action_re().captures(message).ok_or(NpParseError::NoMatch)?;
    if &caps[1] == "s" {
        return Err(NpParseError::SetNotSupported);
    }
    let beatmap_id: i64 = caps[2].parse().map_err(|_| NpParseError::NoMatch)?;
    let game_mode = GameMode::from_np_tag(caps.get(4).map(|m| m.as_str()));
    let mut mods = caps.get(5).map(|m| mods_from_np_str(m.as_str())).unwrap_or(0);
    if caps.get(6).is_some() {
        mods |= MOD_RELAX;
    }
    Ok(ParsedNp { beatmap_id, game_mode, mods })
}
