// Constants for the mini-C interpreter

/// Starting address for symbol addresses
/// Addresses start at 0x00000004 and grow by each symbol's size
pub const STACK_ADDRESS_START: u64 = 0x0000_0004;

/// Largest element count an array declaration may request
pub const MAX_ARRAY_LENGTH: usize = 1 << 20;

/// Function the stepper starts from
pub const ENTRY_FUNCTION: &str = "main";
