//! Shared playback constants

pub const DEFAULT_VELOCITY: u8 = 90;
pub const GHOST_VELOCITY: u8 = 45;
pub const MUTED_VELOCITY: u8 = 40;

/// Acoustic Guitar (nylon) in General MIDI numbering
pub const DEFAULT_PROGRAM: u8 = 24;

pub fn assign_channel(track_index: usize) -> u8 {
    (track_index % 16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_wrap_at_sixteen() {
        assert_eq!(assign_channel(0), 0);
        assert_eq!(assign_channel(15), 15);
        assert_eq!(assign_channel(16), 0);
        assert_eq!(assign_channel(17), 1);
    }
}
