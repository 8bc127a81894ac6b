//! Two-person group registration and participant lookup.

use std::sync::Arc;

use chrono::Utc;
use shared::validation::normalize_email;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::commit_error;
use super::reservations::active_reservation;
use crate::error::DomainError;
use crate::models::{
    ActiveReservationSummary, NewParticipant, Participant, ParticipantProfile, PartnerSummary,
    RegisterPairRequest,
};
use crate::store::{EventStore, Guard, UnitOfWork, WriteIntent};

/// Group size accepted at registration.
const GROUP_SIZE: usize = 2;

pub struct ParticipantService {
    store: Arc<dyn EventStore>,
}

impl ParticipantService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Registers exactly two people and links them as partners in one commit.
    ///
    /// Returns both participants with their partner references set.
    pub async fn register_pair(
        &self,
        request: RegisterPairRequest,
    ) -> Result<Vec<Participant>, DomainError> {
        if request.users.len() != GROUP_SIZE {
            return Err(DomainError::InvalidInput(
                "Exactly 2 people must be registered".into(),
            ));
        }
        request.validate()?;

        let emails: Vec<String> = request
            .users
            .iter()
            .map(|u| normalize_email(&u.email))
            .collect();
        if emails[0] == emails[1] {
            return Err(DomainError::InvalidInput("Emails must be different".into()));
        }

        let existing = self.store.find_participants_by_emails(&emails).await?;
        if !existing.is_empty() {
            return Err(existing_emails_conflict(&existing));
        }

        let mut users = request.users.into_iter();
        let (Some(first), Some(second)) = (users.next(), users.next()) else {
            return Err(DomainError::InvalidInput(
                "Exactly 2 people must be registered".into(),
            ));
        };
        let mut first = new_participant(first, None);
        let second = new_participant(second, Some(first.id));

        self.store
            .commit(
                UnitOfWork::new()
                    .guard(Guard::EmailsUnregistered {
                        emails: emails.clone(),
                    })
                    .write(WriteIntent::InsertParticipant(first.clone()))
                    .write(WriteIntent::InsertParticipant(second.clone()))
                    .write(WriteIntent::LinkPartner {
                        participant_id: first.id,
                        partner_id: second.id,
                    }),
            )
            .await
            .map_err(commit_error)?;

        first.partner_id = Some(second.id);
        info!(
            user1 = %first.id,
            user2 = %second.id,
            "Group registered"
        );
        Ok(vec![first, second])
    }

    /// Participant with partner and active reservation.
    pub async fn find_by_email(&self, email: &str) -> Result<ParticipantProfile, DomainError> {
        let participant = self
            .store
            .find_participant_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".into()))?;

        let partner = match participant.partner_id {
            Some(id) => self
                .store
                .find_participant(id)
                .await?
                .as_ref()
                .map(PartnerSummary::from),
            None => None,
        };

        let reservation = active_reservation(self.store.as_ref(), participant.id)
            .await?
            .map(|r| ActiveReservationSummary {
                id: r.id,
                qr_code: r.qr_code,
                status: r.status,
                timeslot_id: r.timeslot_id,
            });

        Ok(ParticipantProfile {
            participant,
            partner,
            reservation,
        })
    }
}

fn new_participant(input: NewParticipant, partner_id: Option<Uuid>) -> Participant {
    Participant {
        id: Uuid::new_v4(),
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        email: normalize_email(&input.email),
        whatsapp: input.whatsapp,
        partner_id,
        trivia_completed: false,
        created_at: Utc::now(),
    }
}

/// Conflict for already-known emails; partnered ones mean the person already played.
fn existing_emails_conflict(existing: &[Participant]) -> DomainError {
    let participated: Vec<&str> = existing
        .iter()
        .filter(|p| p.has_partner())
        .map(|p| p.email.as_str())
        .collect();

    if !participated.is_empty() {
        return DomainError::Conflict(format!(
            "The group cannot be registered. These emails already participated with a group: {}. Each person can only participate once.",
            participated.join(", ")
        ));
    }

    let registered: Vec<&str> = existing.iter().map(|p| p.email.as_str()).collect();
    DomainError::Conflict(format!(
        "Registration cannot be completed. These emails are already registered: {}.",
        registered.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_participant, TestStore};
    use fake::faker::name::en::{FirstName, LastName};
    use fake::Fake;

    fn person(email: &str) -> NewParticipant {
        NewParticipant {
            first_name: FirstName().fake::<String>() + "a",
            last_name: LastName().fake::<String>() + "a",
            email: email.into(),
            whatsapp: "0991234567".into(),
        }
    }

    fn pair(a: &str, b: &str) -> RegisterPairRequest {
        RegisterPairRequest {
            users: vec![person(a), person(b)],
        }
    }

    #[tokio::test]
    async fn test_register_pair_links_both_sides() {
        let store = TestStore::new();
        let service = ParticipantService::new(store.port());

        let users = service.register_pair(pair("a@x.com", "b@x.com")).await.unwrap();
        assert_eq!(users[0].partner_id, Some(users[1].id));
        assert_eq!(users[1].partner_id, Some(users[0].id));

        let stored_a = store.inner.find_participant(users[0].id).await.unwrap().unwrap();
        let stored_b = store.inner.find_participant(users[1].id).await.unwrap().unwrap();
        assert_eq!(stored_a.partner_id, Some(stored_b.id));
        assert_eq!(stored_b.partner_id, Some(stored_a.id));
    }

    #[tokio::test]
    async fn test_register_requires_exactly_two() {
        let store = TestStore::new();
        let service = ParticipantService::new(store.port());
        let request = RegisterPairRequest {
            users: vec![person("a@x.com")],
        };
        assert!(matches!(
            service.register_pair(request).await,
            Err(DomainError::InvalidInput(_))
        ));

        let request = RegisterPairRequest {
            users: vec![person("a@x.com"), person("b@x.com"), person("c@x.com")],
        };
        assert!(matches!(
            service.register_pair(request).await,
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_register_requires_distinct_emails() {
        let store = TestStore::new();
        let service = ParticipantService::new(store.port());
        assert!(matches!(
            service.register_pair(pair("a@x.com", "A@x.com ")).await,
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_reregistering_partnered_email_is_already_participated() {
        let store = TestStore::new();
        let service = ParticipantService::new(store.port());
        service.register_pair(pair("a@x.com", "b@x.com")).await.unwrap();

        let err = service
            .register_pair(pair("a@x.com", "c@x.com"))
            .await
            .unwrap_err();
        match err {
            DomainError::Conflict(msg) => assert!(msg.contains("already participated")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store
            .inner
            .find_participant_by_email("c@x.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_registered_without_group_is_plain_conflict() {
        let store = TestStore::new();
        let service = ParticipantService::new(store.port());
        seed_participant(&store, "solo@x.com", None).await;

        let err = service
            .register_pair(pair("solo@x.com", "new@x.com"))
            .await
            .unwrap_err();
        match err {
            DomainError::Conflict(msg) => {
                assert!(msg.contains("already registered"));
                assert!(!msg.contains("participated"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_whatsapp_rejected() {
        let store = TestStore::new();
        let service = ParticipantService::new(store.port());
        let mut request = pair("a@x.com", "b@x.com");
        request.users[1].whatsapp = "12345".into();
        assert!(matches!(
            service.register_pair(request).await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(store.inner.list_participants().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let store = TestStore::new();
        let service = ParticipantService::new(store.port());
        let users = service.register_pair(pair("a@x.com", "b@x.com")).await.unwrap();

        let profile = service.find_by_email(" A@x.com").await.unwrap();
        assert_eq!(profile.participant.id, users[0].id);
        assert_eq!(profile.partner.unwrap().id, users[1].id);
        assert!(profile.reservation.is_none());

        assert!(matches!(
            service.find_by_email("nobody@x.com").await,
            Err(DomainError::NotFound(_))
        ));
    }
}
