//! Volume control
//!
//! `MixerController` guards the core against misbehaving mixers: failures and
//! out-of-range values are logged and reported as "unknown" instead of
//! propagating. `SoftwareMixer` is an in-process mixer with logarithmic
//! scaling for outputs without hardware volume.

use crate::error::{PlaybackError, Result};
use crate::state::MixerState;
use async_trait::async_trait;
use lyra_core::Mixer;
use std::sync::{Arc, Mutex, PoisonError};

/// Safe front for an optional mixer
#[derive(Clone, Default)]
pub struct MixerController {
    mixer: Option<Arc<dyn Mixer>>,
}

impl std::fmt::Debug for MixerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixerController")
            .field("has_mixer", &self.mixer.is_some())
            .finish()
    }
}

impl MixerController {
    /// Wrap a mixer (or none)
    pub fn new(mixer: Option<Arc<dyn Mixer>>) -> Self {
        Self { mixer }
    }

    /// Volume in `0..=100`, `None` if there is no mixer or it misbehaved
    pub async fn get_volume(&self) -> Option<u8> {
        let mixer = self.mixer.as_ref()?;
        match mixer.get_volume().await {
            Ok(Some(volume)) if volume > 100 => {
                tracing::error!("Mixer returned bad volume: {}", volume);
                None
            }
            Ok(volume) => volume,
            Err(e) => {
                tracing::error!("Mixer failed to get volume: {}", e);
                None
            }
        }
    }

    /// Set the volume; returns whether the mixer accepted it
    pub async fn set_volume(&self, volume: u8) -> Result<bool> {
        if volume > 100 {
            return Err(PlaybackError::invalid_argument(format!(
                "Volume must be between 0 and 100, got {volume}"
            )));
        }
        let Some(mixer) = &self.mixer else {
            return Ok(false);
        };
        match mixer.set_volume(volume).await {
            Ok(accepted) => Ok(accepted),
            Err(e) => {
                tracing::error!("Mixer failed to set volume: {}", e);
                Ok(false)
            }
        }
    }

    /// Mute state, `None` if there is no mixer or it misbehaved
    pub async fn get_mute(&self) -> Option<bool> {
        let mixer = self.mixer.as_ref()?;
        match mixer.get_mute().await {
            Ok(mute) => mute,
            Err(e) => {
                tracing::error!("Mixer failed to get mute state: {}", e);
                None
            }
        }
    }

    /// Set mute state; returns whether the mixer accepted it
    pub async fn set_mute(&self, mute: bool) -> bool {
        let Some(mixer) = &self.mixer else {
            return false;
        };
        match mixer.set_mute(mute).await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!("Mixer failed to set mute state: {}", e);
                false
            }
        }
    }

    pub(crate) async fn save_state(&self) -> MixerState {
        MixerState {
            volume: self.get_volume().await,
            mute: self.get_mute().await,
        }
    }
}

#[derive(Debug)]
struct SoftwareLevel {
    level: u8,
    muted: bool,
}

/// In-process mixer with logarithmic scaling
///
/// 0% = -60 dB (silence), 100% = 0 dB (unity gain). Muting preserves the level.
#[derive(Debug)]
pub struct SoftwareMixer {
    state: Mutex<SoftwareLevel>,
}

impl SoftwareMixer {
    /// Create a mixer at the given level (clamped to 100)
    pub fn new(level: u8) -> Self {
        Self {
            state: Mutex::new(SoftwareLevel {
                level: level.min(100),
                muted: false,
            }),
        }
    }

    fn snapshot(&self) -> (u8, bool) {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        (state.level, state.muted)
    }

    /// Linear gain multiplier for the output stage
    ///
    /// Formula: gain = 10^((level% - 100) * 0.6 / 20)
    pub fn gain(&self) -> f32 {
        let (level, muted) = self.snapshot();
        if muted || level == 0 {
            return 0.0;
        }
        let db = (level as f32 - 100.0) * 0.6;
        10.0_f32.powf(db / 20.0)
    }

    /// Current attenuation in dB (-60 when silent)
    pub fn to_db(&self) -> f32 {
        let gain = self.gain();
        if gain == 0.0 {
            -60.0
        } else {
            20.0 * gain.log10()
        }
    }
}

impl Default for SoftwareMixer {
    fn default() -> Self {
        Self::new(80)
    }
}

#[async_trait]
impl Mixer for SoftwareMixer {
    async fn get_volume(&self) -> lyra_core::Result<Option<u8>> {
        Ok(Some(self.snapshot().0))
    }

    async fn set_volume(&self, volume: u8) -> lyra_core::Result<bool> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .level = volume.min(100);
        Ok(true)
    }

    async fn get_mute(&self) -> lyra_core::Result<Option<bool>> {
        Ok(Some(self.snapshot().1))
    }

    async fn set_mute(&self, mute: bool) -> lyra_core::Result<bool> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .muted = mute;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::LyraError;

    struct BrokenMixer;

    #[async_trait]
    impl Mixer for BrokenMixer {
        async fn get_volume(&self) -> lyra_core::Result<Option<u8>> {
            Ok(Some(150))
        }

        async fn set_volume(&self, _volume: u8) -> lyra_core::Result<bool> {
            Err(LyraError::mixer("device gone"))
        }

        async fn get_mute(&self) -> lyra_core::Result<Option<bool>> {
            Err(LyraError::mixer("device gone"))
        }

        async fn set_mute(&self, _mute: bool) -> lyra_core::Result<bool> {
            Err(LyraError::mixer("device gone"))
        }
    }

    #[tokio::test]
    async fn no_mixer_reports_unknown() {
        let mixer = MixerController::new(None);
        assert_eq!(mixer.get_volume().await, None);
        assert_eq!(mixer.get_mute().await, None);
        assert!(!mixer.set_volume(50).await.unwrap());
        assert!(!mixer.set_mute(true).await);
    }

    #[tokio::test]
    async fn volume_above_100_is_invalid() {
        let mixer = MixerController::new(Some(Arc::new(SoftwareMixer::default())));
        assert!(matches!(
            mixer.set_volume(101).await,
            Err(PlaybackError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn broken_mixer_is_contained() {
        let mixer = MixerController::new(Some(Arc::new(BrokenMixer)));
        assert_eq!(mixer.get_volume().await, None);
        assert_eq!(mixer.get_mute().await, None);
        assert!(!mixer.set_volume(10).await.unwrap());
        assert!(!mixer.set_mute(true).await);
    }

    #[tokio::test]
    async fn software_mixer_round_trip() {
        let mixer = MixerController::new(Some(Arc::new(SoftwareMixer::new(30))));
        assert_eq!(mixer.get_volume().await, Some(30));
        assert!(mixer.set_volume(75).await.unwrap());
        assert!(mixer.set_mute(true).await);

        let state = mixer.save_state().await;
        assert_eq!(state.volume, Some(75));
        assert_eq!(state.mute, Some(true));
    }

    #[test]
    fn gain_calculation() {
        assert_eq!(SoftwareMixer::new(0).gain(), 0.0);
        assert!((SoftwareMixer::new(100).gain() - 1.0).abs() < 0.001);
        assert!((SoftwareMixer::new(50).gain() - 0.0316).abs() < 0.001);
        assert!((SoftwareMixer::new(80).to_db() + 12.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn mute_preserves_level() {
        let mixer = SoftwareMixer::new(80);
        mixer.set_mute(true).await.unwrap();
        assert_eq!(mixer.gain(), 0.0);
        assert_eq!(mixer.get_volume().await.unwrap(), Some(80));

        mixer.set_mute(false).await.unwrap();
        assert!(mixer.gain() > 0.0);
    }
}
