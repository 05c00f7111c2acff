//! # Economy & Wire Constants
//!
//! Defaults the server ships with. The client reads its live values from
//! `ShopConfig`; these only seed that config.
//!
//! **CRITICAL:** Changing a default here without changing the server's
//! rules makes every optimistic guess wrong until the next snapshot.

// =============================================================================
// SHOP RULES
// =============================================================================

/// Number of slots in a player's shop.
pub const DEFAULT_SHOP_SIZE: usize = 5;

/// Gold charged for a reroll when no free reroll is available.
pub const DEFAULT_REROLL_COST: u32 = 2;

/// Gold charged for one experience purchase.
pub const DEFAULT_XP_COST: u32 = 4;

/// Level at which experience can no longer be bought.
pub const DEFAULT_MAX_LEVEL: u32 = 10;

// =============================================================================
// WIRE LIMITS
// =============================================================================

/// Largest frame the codec accepts, in bytes.
///
/// A full snapshot with a 5-slot shop encodes to well under 1 KiB.
pub const MAX_FRAME_SIZE: usize = 16 * 1024;
