use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use super::dispatcher::{DispatchError, DispatchResult, NewReport, ReportDispatcher};
use super::domain::{OfficeRef, Reporter};
use super::location::Location;
use super::repository::{PhotoStore, PhotoUpload, ReportStore, StoreError};
use super::transport::MailTransport;
use crate::workflows::offices::{ContactEnricher, GeoResolver};

/// Raw submission as received from a citizen.
#[derive(Debug, Clone)]
pub struct ReportSubmission {
    pub description: String,
    pub location: Location,
    pub offices: Vec<OfficeRef>,
    pub reporter: Reporter,
    pub photo: Option<PhotoUpload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeReceipt {
    #[serde(flatten)]
    pub dispatch: DispatchResult,
    pub photo_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("photo could not be stored: {0}")]
    PhotoUnavailable(#[source] StoreError),
}

/// Submission pipeline: validation, photo storage, location derivation, dispatch.
pub struct ReportIntake<S, T, P, E> {
    dispatcher: Arc<ReportDispatcher<S, T>>,
    photos: Arc<P>,
    resolver: Arc<GeoResolver<E>>,
}

impl<S, T, P, E> ReportIntake<S, T, P, E>
where
    S: ReportStore + 'static,
    T: MailTransport + 'static,
    P: PhotoStore + 'static,
    E: ContactEnricher + 'static,
{
    pub fn new(
        dispatcher: Arc<ReportDispatcher<S, T>>,
        photos: Arc<P>,
        resolver: Arc<GeoResolver<E>>,
    ) -> Self {
        Self {
            dispatcher,
            photos,
            resolver,
        }
    }

    pub async fn submit(&self, submission: ReportSubmission) -> Result<IntakeReceipt, IntakeError> {
        let ReportSubmission {
            description,
            mut location,
            offices,
            reporter,
            photo,
        } = submission;

        let mut draft = NewReport {
            description,
            photo_url: None,
            location: location.clone(),
            reporter,
        };
        self.dispatcher.validate(&draft, &offices)?;

        if let Some(upload) = photo {
            let url = self.photos.store(upload).map_err(|err| {
                error!(error = %err, "photo storage failed");
                IntakeError::PhotoUnavailable(err)
            })?;
            draft.photo_url = Some(url);
        }

        self.derive_location(&mut location);
        draft.location = location;

        let photo_url = draft.photo_url.clone();
        let dispatch = self.dispatcher.dispatch(draft, offices).await?;
        Ok(IntakeReceipt {
            dispatch,
            photo_url,
        })
    }

    /// Fills undetermined city/district/province from the nearest office.
    fn derive_location(&self, location: &mut Location) {
        if !location.has_unknown_region() {
            return;
        }
        let radius = self.resolver.default_radius_km();
        match self.resolver.rank(location.coordinates(), radius) {
            Ok(resolution) => {
                debug!(
                    office = %resolution.nearest.office.id,
                    within_radius = resolution.within_radius,
                    "location derived from nearest office"
                );
                location.fill_from_office(&resolution.nearest.office);
            }
            Err(err) => {
                debug!(error = %err, "location left undetermined");
            }
        }
    }
}
