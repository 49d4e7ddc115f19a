//! Background profile loading.
//!
//! `ProfileManager` owns the "currently loaded profile". A load fetches
//! bytes, decodes them on the blocking pool and installs the result as a
//! single `Arc` swap, so the audio side sees either the old profile or the
//! new one and never a half-built buffer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use super::source::ByteSource;
use crate::dsp::ResampledImpulse;
use crate::error::{LoadError, RateKind};
use crate::profile::AmplifierProfile;
use crate::switcher::{Completion, LoadTicket, ProfileSwitcher};
use crate::tapf::{ProfileDecoder, check_sample_rate};

/// A decoded profile ready to install into the audio graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProfile {
    pub profile: AmplifierProfile,
    pub impulse: ResampledImpulse,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The requested profile is already installed or already loading.
    Unchanged,
    /// The profile was loaded and is now active.
    Installed(Arc<LoadedProfile>),
    /// A newer request arrived while this one was loading; its result was dropped.
    Stale,
}

#[derive(Debug, Default)]
struct Slot {
    switcher: ProfileSwitcher,
    active: Option<Arc<LoadedProfile>>,
}

/// Loads profiles from a [`ByteSource`] for one playback sample rate.
pub struct ProfileManager<S> {
    source: S,
    decoder: Arc<ProfileDecoder>,
    sample_rate: u32,
    slot: Mutex<Slot>,
}

impl<S: ByteSource + Sync> ProfileManager<S> {
    pub fn new(source: S, sample_rate: u32) -> Result<Self, LoadError> {
        let sample_rate = check_sample_rate(sample_rate as f64, RateKind::Target)?;
        Ok(ProfileManager {
            source,
            decoder: Arc::new(ProfileDecoder::default()),
            sample_rate,
            slot: Mutex::new(Slot::default()),
        })
    }

    pub fn with_decoder(mut self, decoder: ProfileDecoder) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn byte_source(&self) -> &S {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The installed profile, if any.
    pub fn active(&self) -> Option<Arc<LoadedProfile>> {
        self.lock().active.clone()
    }

    pub fn current_source(&self) -> Option<String> {
        self.lock().switcher.current().map(str::to_string)
    }

    /// Make `source` the active profile.
    ///
    /// On error the previously active profile stays installed.
    pub async fn load(&self, source: &str) -> Result<LoadOutcome, LoadError> {
        let Some(ticket) = self.lock().switcher.request(source) else {
            return Ok(LoadOutcome::Unchanged);
        };

        let result = self.fetch_and_decode(&ticket).await;

        // Bad bytes must not be served again from a cache.
        if let Err(LoadError::Decode(_)) = &result {
            if let Err(e) = self.source.invalidate(source).await {
                warn!("could not evict profile '{source}': {e}");
            }
        }

        // Settle and install under one lock so two loads cannot interleave.
        let mut slot = self.lock();
        match slot.switcher.complete(&ticket, result) {
            Completion::Installed(loaded) => {
                let loaded = Arc::new(loaded);
                slot.active = Some(Arc::clone(&loaded));
                info!(
                    "installed profile '{source}' ({} params, {} IR samples @ {} Hz)",
                    loaded.profile.len(),
                    loaded.impulse.len(),
                    loaded.impulse.sample_rate,
                );
                Ok(LoadOutcome::Installed(loaded))
            }
            Completion::Failed(e) => {
                warn!("profile '{source}' failed to load: {e}");
                Err(e)
            }
            Completion::Stale => {
                debug!("discarding stale load of '{source}'");
                Ok(LoadOutcome::Stale)
            }
        }
    }

    async fn fetch_and_decode(&self, ticket: &LoadTicket) -> Result<LoadedProfile, LoadError> {
        let bytes = self.source.fetch(ticket.source()).await?;

        let decoder = Arc::clone(&self.decoder);
        let name = ticket.source().to_string();
        let rate = self.sample_rate;
        let (profile, impulse) =
            tokio::task::spawn_blocking(move || decoder.decode(&bytes, &name, rate)).await??;

        Ok(LoadedProfile { profile, impulse })
    }
}
