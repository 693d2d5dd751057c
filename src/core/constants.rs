// Tick and timing
pub const TICK_INTERVAL_MS: u64 = 1000;

// Turn readiness
pub const READINESS_RESET_SECONDS: f64 = 7.0;

// Basic attacks deal a third of the raw weapon formula so that invested
// skill usage stays ahead of autoattacking. Tuning value, not an invariant.
pub const BASIC_ATTACK_DIVISOR: i64 = 3;
pub const DEFAULT_UNARMED_FORMULA: &str = "[STR]+1d2";

// XP and leveling
pub const XP_BASE_THRESHOLD: u64 = 100;
pub const XP_GROWTH_FACTOR: f64 = 1.5;
pub const LEVEL_HP_BASE_GAIN: i32 = 5;

// Character creation
pub const CHAR_BASE_HP: i32 = 20;
pub const HP_PER_CONSTITUTION: i32 = 5;

// Enemy behavior timing
pub const ENEMY_IDLE_MIN_SECONDS: f64 = 1.0;
pub const ENEMY_IDLE_MAX_SECONDS: f64 = 4.0;
pub const STAGGER_RESET_SECONDS: f64 = 2.0;

// Fallback move synthesized for enemies with an empty move table
pub const DEFAULT_MOVE_CHARGE_SECONDS: f64 = 2.0;
pub const DEFAULT_MOVE_STAGGER_CHANCE: f64 = 0.25;

// Enemy phase thresholds (fraction of max HP)
pub const PHASE_ENRAGE_THRESHOLD: f64 = 0.6;
pub const PHASE_PRESSURE_THRESHOLD: f64 = 0.4;
pub const PHASE_DESPERATION_THRESHOLD: f64 = 0.2;
pub const LOW_HEALTH_THRESHOLD: f64 = 0.3;

// Enrage self-buff applied at the 60% phase
pub const ENRAGE_DAMAGE_MULTIPLIER: f64 = 1.5;
// Duration used for effects that persist until explicitly cleared
pub const PERSISTENT_STATUS_SECONDS: f64 = 86_400.0;

// Status effects
pub const DOT_DAMAGE_PER_TICK: i32 = 1;

// Equipment
pub const MAX_ACCESSORIES: usize = 3;

// Skill and item effects
pub const STEAL_CREDITS_AMOUNT: i64 = 25;
pub const REVIVE_ITEM_PERCENT: f64 = 0.5;

// Formula evaluator guards against pathological content
pub const DICE_MAX_COUNT: u32 = 100;
pub const DICE_MAX_SIDES: u32 = 1000;

// Save format
pub const SAVE_VERSION_MAGIC: u64 = 0x494E_5254_0000_0001; // "INRT" + version
