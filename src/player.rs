//! Timed frame playback.
//!
//! The encoder itself is clock-free; [`Player`] drives it from a tokio
//! interval at a clamped frame rate and hands each frame to a render
//! callback.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::encoder::{Frame, StreamEncoder};

/// Slowest supported frame rate.
pub const MIN_FPS: u32 = 1;

/// Fastest supported frame rate.
pub const MAX_FPS: u32 = 20;

/// Frames per second, clamped to `MIN_FPS..=MAX_FPS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate(u32);

impl FrameRate {
    pub fn new(fps: u32) -> Self {
        Self(fps.clamp(MIN_FPS, MAX_FPS))
    }

    pub fn fps(self) -> u32 {
        self.0
    }

    /// Time between two frames.
    pub fn interval(self) -> Duration {
        Duration::from_secs(1) / self.0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(5)
    }
}

/// Plays an encoder's frames at a fixed rate.
pub struct Player {
    encoder: StreamEncoder,
    rate: FrameRate,
}

impl Player {
    pub fn new(encoder: StreamEncoder, rate: FrameRate) -> Self {
        Self { encoder, rate }
    }

    pub fn encoder(&self) -> &StreamEncoder {
        &self.encoder
    }

    /// Mutable access for reconfiguration between runs; any change rewinds
    /// playback to frame 0.
    pub fn encoder_mut(&mut self) -> &mut StreamEncoder {
        &mut self.encoder
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    pub fn set_rate(&mut self, rate: FrameRate) {
        self.rate = rate;
    }

    /// Shows frames until `cycles` full cycles have played (forever if
    /// `None`) or the callback fails.
    ///
    /// Late ticks are skipped rather than bunched up, so a slow renderer
    /// drops frames instead of speeding up afterwards. Returns the number of
    /// frames shown.
    pub async fn run<F, E>(&mut self, cycles: Option<usize>, mut on_frame: F) -> Result<usize, E>
    where
        F: FnMut(&Frame) -> Result<(), E>,
    {
        let limit = cycles.map(|c| c.saturating_mul(self.encoder.chunk_count()));
        let mut ticker = interval(self.rate.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(
            fps = self.rate.fps(),
            frames_per_cycle = self.encoder.chunk_count(),
            "Starting playback"
        );

        let mut shown = 0;
        while limit.map_or(true, |limit| shown < limit) {
            ticker.tick().await;
            let frame = self.encoder.tick();
            on_frame(&frame)?;
            shown += 1;
        }
        Ok(shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Tier;
    use crate::transform::Transform;

    #[test]
    fn test_frame_rate_clamps() {
        assert_eq!(FrameRate::new(0).fps(), 1);
        assert_eq!(FrameRate::new(60).fps(), 20);
        assert_eq!(FrameRate::new(10).interval(), Duration::from_millis(100));
        assert_eq!(FrameRate::default().fps(), 5);
    }

    #[tokio::test]
    async fn test_plays_one_cycle_in_order() {
        let encoder = StreamEncoder::new(&"p".repeat(150), Tier::H, Transform::Plain).unwrap();
        let n = encoder.chunk_count();
        let mut player = Player::new(encoder, FrameRate::new(MAX_FPS));

        let mut seen = Vec::new();
        let shown = player
            .run(Some(1), |frame| {
                seen.push(frame.index);
                Ok::<(), ()>(())
            })
            .await
            .unwrap();

        assert_eq!(shown, n);
        assert_eq!(seen, (0..n).collect::<Vec<_>>());
        assert_eq!(player.encoder().frame_index(), 0);
    }

    #[tokio::test]
    async fn test_callback_error_stops_playback() {
        let encoder = StreamEncoder::new(&"p".repeat(150), Tier::H, Transform::Plain).unwrap();
        let mut player = Player::new(encoder, FrameRate::new(MAX_FPS));

        let mut calls = 0;
        let result = player
            .run(None, |_| {
                calls += 1;
                if calls == 3 {
                    Err("stop")
                } else {
                    Ok(())
                }
            })
            .await;

        assert_eq!(result, Err("stop"));
        assert_eq!(calls, 3);
    }
}
