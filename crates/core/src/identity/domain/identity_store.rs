use std::collections::HashMap;

use thiserror::Error;

use crate::analysis::domain::observation::Observation;
use crate::identity::domain::face_gallery::FaceGallery;
use crate::identity::domain::identity::{Identity, IdentityKey};
use crate::identity::domain::identity_resolver::IdentityResolver;
use crate::shared::frame::Frame;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown identity {0}")]
pub struct UnknownIdentityError(pub IdentityKey);

/// Every identity seen in a run, plus the gallery used to recognise them.
///
/// Identities are never split, merged or removed once minted.
pub struct FaceIdentityStore {
    resolver: Box<dyn IdentityResolver>,
    gallery: FaceGallery,
    identities: Vec<Identity>,
    index: HashMap<IdentityKey, usize>,
    next_key: u32,
}

impl FaceIdentityStore {
    pub fn new(resolver: Box<dyn IdentityResolver>, gallery: FaceGallery) -> Self {
        Self {
            resolver,
            gallery,
            identities: Vec::new(),
            index: HashMap::new(),
            next_key: 0,
        }
    }

    /// Returns the identity `crop` belongs to, minting a new one (and saving
    /// the crop to the gallery) when the resolver finds no indexed match.
    ///
    /// Resolver failures count as no match. Gallery write failures are
    /// returned.
    pub fn resolve_or_create(
        &mut self,
        crop: &Frame,
        frame_number: usize,
        ordinal: usize,
    ) -> Result<IdentityKey, Box<dyn std::error::Error>> {
        match self.resolver.find_match(crop, self.gallery.dir()) {
            Ok(Some(path)) => match self.gallery.key_for(&path) {
                Some(key) => return Ok(key),
                None => log::debug!(
                    "Matched {} which is not part of this run's gallery",
                    path.display()
                ),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Identity lookup failed on frame {frame_number}: {e}"),
        }

        let key = IdentityKey::new(self.next_key);
        self.gallery.add(key, crop, frame_number, ordinal)?;
        self.next_key += 1;
        self.index.insert(key, self.identities.len());
        self.identities.push(Identity::new(key));
        log::debug!("New identity {key} on frame {frame_number}");
        Ok(key)
    }

    pub fn record(
        &mut self,
        key: IdentityKey,
        observation: Observation,
    ) -> Result<(), UnknownIdentityError> {
        let slot = *self.index.get(&key).ok_or(UnknownIdentityError(key))?;
        self.identities[slot].push(observation);
        Ok(())
    }

    /// Identities in order of first appearance.
    pub fn all_identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn get(&self, key: IdentityKey) -> Option<&Identity> {
        self.index.get(&key).map(|&slot| &self.identities[slot])
    }

    pub fn gallery(&self) -> &FaceGallery {
        &self.gallery
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
