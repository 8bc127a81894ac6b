//! Reservation lifecycle: booking, check-in, reassignment, rating and cancellation.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::commit_error;
use super::notification::{NotificationResult, NotificationService, ReservationConfirmation};
use super::qr::{TokenGenerator, UuidTokenGenerator};
use crate::error::DomainError;
use crate::models::reservation::UNRATED_LABEL;
use crate::models::{
    CheckedInGroup, CheckedInMember, InterestRating, Participant, Reservation,
    ReservationDetails, ReservationStatus, TimeSlot,
};
use crate::store::{EventStore, Guard, UnitOfWork, WriteIntent};

/// The participant's single non-cancelled reservation, if any.
///
/// More than one active reservation is a broken invariant and is reported
/// instead of silently picking the newest.
pub(crate) async fn active_reservation(
    store: &dyn EventStore,
    user_id: Uuid,
) -> Result<Option<Reservation>, DomainError> {
    let mut active = store.active_reservations_for_user(user_id).await?;
    if active.len() > 1 {
        error!(
            user_id = %user_id,
            count = active.len(),
            "Participant holds more than one active reservation"
        );
        return Err(DomainError::Conflict(format!(
            "User {} holds {} active reservations",
            user_id,
            active.len()
        )));
    }
    Ok(active.pop())
}

pub struct ReservationService {
    store: Arc<dyn EventStore>,
    notifier: Arc<dyn NotificationService>,
    tokens: Arc<dyn TokenGenerator>,
}

impl ReservationService {
    pub fn new(store: Arc<dyn EventStore>, notifier: Arc<dyn NotificationService>) -> Self {
        Self {
            store,
            notifier,
            tokens: Arc::new(UuidTokenGenerator),
        }
    }

    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Books one seat for a participant who passed the trivia.
    pub async fn create(
        &self,
        user_id: Uuid,
        timeslot_id: Uuid,
    ) -> Result<ReservationDetails, DomainError> {
        let user = self.participant(user_id).await?;
        let slot = self.timeslot(timeslot_id).await?;

        self.ensure_can_book(&user).await?;
        self.ensure_capacity(&slot, 1, &[]).await?;

        let reservation = self.new_reservation(user.id, slot.id);
        self.store
            .commit(
                UnitOfWork::new()
                    .guard(Guard::NoActiveReservation { user_id: user.id })
                    .guard(Guard::SlotHasCapacity {
                        timeslot_id: slot.id,
                        seats: 1,
                        excluding: vec![],
                    })
                    .write(WriteIntent::InsertReservation(reservation.clone())),
            )
            .await
            .map_err(commit_error)?;

        info!(
            reservation_id = %reservation.id,
            user_id = %user.id,
            timeslot_id = %slot.id,
            "Reservation created"
        );

        let details = ReservationDetails {
            reservation,
            user,
            timeslot: slot,
        };
        self.notify(&details, None).await;
        Ok(details)
    }

    /// Books both partners into the same slot, or neither.
    pub async fn create_pair(
        &self,
        user_id: Uuid,
        partner_id: Uuid,
        timeslot_id: Uuid,
    ) -> Result<Vec<ReservationDetails>, DomainError> {
        let user = self.participant(user_id).await?;
        let partner = self.participant(partner_id).await?;
        ensure_partners(&user, &partner)?;
        let slot = self.timeslot(timeslot_id).await?;

        self.ensure_can_book(&user).await?;
        self.ensure_can_book(&partner).await?;
        self.ensure_capacity(&slot, 2, &[]).await?;

        let first = self.new_reservation(user.id, slot.id);
        let second = self.new_reservation(partner.id, slot.id);
        // Row locks are taken in id order so swapped concurrent requests cannot deadlock.
        let (low, high) = if user.id < partner.id {
            (user.id, partner.id)
        } else {
            (partner.id, user.id)
        };
        self.store
            .commit(
                UnitOfWork::new()
                    .guard(Guard::NoActiveReservation { user_id: low })
                    .guard(Guard::NoActiveReservation { user_id: high })
                    .guard(Guard::SlotHasCapacity {
                        timeslot_id: slot.id,
                        seats: 2,
                        excluding: vec![],
                    })
                    .write(WriteIntent::InsertReservation(first.clone()))
                    .write(WriteIntent::InsertReservation(second.clone())),
            )
            .await
            .map_err(commit_error)?;

        info!(
            user_id = %user.id,
            partner_id = %partner.id,
            timeslot_id = %slot.id,
            "Pair reservation created"
        );

        let user_name = user.full_name();
        let partner_name = partner.full_name();
        let booked = vec![
            ReservationDetails {
                reservation: first,
                user,
                timeslot: slot.clone(),
            },
            ReservationDetails {
                reservation: second,
                user: partner,
                timeslot: slot,
            },
        ];
        self.notify(&booked[0], Some(partner_name)).await;
        self.notify(&booked[1], Some(user_name)).await;
        Ok(booked)
    }

    /// Looks up a reservation by QR without changing it.
    pub async fn get_by_qr(&self, qr_code: &str) -> Result<ReservationDetails, DomainError> {
        let reservation = self.by_qr(qr_code).await?;
        self.details(reservation).await
    }

    /// RESERVED -> USED.
    pub async fn check_in(&self, qr_code: &str) -> Result<ReservationDetails, DomainError> {
        let reservation = self.by_qr(qr_code).await?;
        ensure_reserved(&reservation)?;

        let at = Utc::now();
        self.store
            .commit(
                UnitOfWork::new()
                    .guard(Guard::ReservationIs {
                        reservation_id: reservation.id,
                        status: ReservationStatus::Reserved,
                    })
                    .write(WriteIntent::CheckInReservation {
                        reservation_id: reservation.id,
                        at,
                    }),
            )
            .await
            .map_err(commit_error)?;

        info!(reservation_id = %reservation.id, "Reservation checked in");
        self.details(Reservation {
            status: ReservationStatus::Used,
            checked_in_at: Some(at),
            ..reservation
        })
        .await
    }

    /// Checks in both partners together; either both transition or neither does.
    pub async fn check_in_group(
        &self,
        qr_code1: &str,
        qr_code2: &str,
    ) -> Result<Vec<Reservation>, DomainError> {
        let (first, second) = self.group(qr_code1, qr_code2).await?;
        ensure_reserved(&first)?;
        ensure_reserved(&second)?;

        let at = Utc::now();
        let mut unit = UnitOfWork::new();
        for r in [&first, &second] {
            unit = unit
                .guard(Guard::ReservationIs {
                    reservation_id: r.id,
                    status: ReservationStatus::Reserved,
                })
                .write(WriteIntent::CheckInReservation {
                    reservation_id: r.id,
                    at,
                });
        }
        self.store.commit(unit).await.map_err(commit_error)?;

        info!(
            reservation1 = %first.id,
            reservation2 = %second.id,
            "Group checked in"
        );
        Ok([first, second]
            .into_iter()
            .map(|r| Reservation {
                status: ReservationStatus::Used,
                checked_in_at: Some(at),
                ..r
            })
            .collect())
    }

    /// Moves one RESERVED reservation to another slot.
    pub async fn reassign(
        &self,
        qr_code: &str,
        new_timeslot_id: Uuid,
    ) -> Result<ReservationDetails, DomainError> {
        let reservation = self.by_qr(qr_code).await?;
        ensure_reserved(&reservation)?;
        let slot = self.timeslot(new_timeslot_id).await?;
        self.ensure_capacity(&slot, 1, &[reservation.id]).await?;

        self.store
            .commit(
                UnitOfWork::new()
                    .guard(Guard::ReservationIs {
                        reservation_id: reservation.id,
                        status: ReservationStatus::Reserved,
                    })
                    .guard(Guard::SlotHasCapacity {
                        timeslot_id: slot.id,
                        seats: 1,
                        excluding: vec![reservation.id],
                    })
                    .write(WriteIntent::MoveReservation {
                        reservation_id: reservation.id,
                        timeslot_id: slot.id,
                    }),
            )
            .await
            .map_err(commit_error)?;

        info!(
            reservation_id = %reservation.id,
            from = %reservation.timeslot_id,
            to = %slot.id,
            "Reservation reassigned"
        );
        self.details(Reservation {
            timeslot_id: slot.id,
            ..reservation
        })
        .await
    }

    /// Moves both partners' reservations to one slot with room for two.
    pub async fn reassign_group(
        &self,
        qr_code1: &str,
        qr_code2: &str,
        new_timeslot_id: Uuid,
    ) -> Result<Vec<Reservation>, DomainError> {
        let (first, second) = self.group(qr_code1, qr_code2).await?;
        ensure_reserved(&first)?;
        ensure_reserved(&second)?;
        let slot = self.timeslot(new_timeslot_id).await?;
        let moving = vec![first.id, second.id];
        self.ensure_capacity(&slot, 2, &moving).await?;

        let mut unit = UnitOfWork::new().guard(Guard::SlotHasCapacity {
            timeslot_id: slot.id,
            seats: 2,
            excluding: moving,
        });
        for r in [&first, &second] {
            unit = unit
                .guard(Guard::ReservationIs {
                    reservation_id: r.id,
                    status: ReservationStatus::Reserved,
                })
                .write(WriteIntent::MoveReservation {
                    reservation_id: r.id,
                    timeslot_id: slot.id,
                });
        }
        self.store.commit(unit).await.map_err(commit_error)?;

        info!(
            reservation1 = %first.id,
            reservation2 = %second.id,
            to = %slot.id,
            "Group reassigned"
        );
        Ok([first, second]
            .into_iter()
            .map(|r| Reservation {
                timeslot_id: slot.id,
                ..r
            })
            .collect())
    }

    /// Rates both reservations of a checked-in pair.
    pub async fn rate_group(
        &self,
        reservation_id1: Uuid,
        reservation_id2: Uuid,
        rating: i16,
    ) -> Result<Vec<Reservation>, DomainError> {
        let rating = InterestRating::try_from(rating).map_err(DomainError::InvalidInput)?;
        let first = self.reservation(reservation_id1).await?;
        let second = self.reservation(reservation_id2).await?;
        if first.id == second.id {
            return Err(DomainError::InvalidInput(
                "Two different reservations are required".into(),
            ));
        }
        let owner = self.participant(first.user_id).await?;
        if owner.partner_id != Some(second.user_id) {
            return Err(DomainError::InvalidInput(
                "Reservations do not belong to the same group".into(),
            ));
        }
        for r in [&first, &second] {
            if r.status != ReservationStatus::Used {
                return Err(DomainError::InvalidInput(format!(
                    "Reservation {} has not been checked in",
                    r.id
                )));
            }
        }

        let mut unit = UnitOfWork::new();
        for r in [&first, &second] {
            unit = unit
                .guard(Guard::ReservationIs {
                    reservation_id: r.id,
                    status: ReservationStatus::Used,
                })
                .write(WriteIntent::RateReservation {
                    reservation_id: r.id,
                    rating,
                });
        }
        self.store.commit(unit).await.map_err(commit_error)?;

        info!(
            reservation1 = %first.id,
            reservation2 = %second.id,
            rating = rating.value(),
            "Group rated"
        );
        Ok([first, second]
            .into_iter()
            .map(|r| Reservation {
                interest_rating: Some(rating),
                ..r
            })
            .collect())
    }

    /// RESERVED -> CANCELLED; the seat is released.
    pub async fn cancel(&self, qr_code: &str) -> Result<Reservation, DomainError> {
        let reservation = self.by_qr(qr_code).await?;
        ensure_reserved(&reservation)?;

        self.store
            .commit(
                UnitOfWork::new()
                    .guard(Guard::ReservationIs {
                        reservation_id: reservation.id,
                        status: ReservationStatus::Reserved,
                    })
                    .write(WriteIntent::CancelReservation {
                        reservation_id: reservation.id,
                    }),
            )
            .await
            .map_err(commit_error)?;

        info!(reservation_id = %reservation.id, "Reservation cancelled");
        Ok(Reservation {
            status: ReservationStatus::Cancelled,
            ..reservation
        })
    }

    /// Pairs whose reservations are both USED, newest check-in first.
    pub async fn checked_in_groups(&self) -> Result<Vec<CheckedInGroup>, DomainError> {
        let used = self
            .store
            .list_reservations(Some(ReservationStatus::Used))
            .await?;

        let mut seen = HashSet::new();
        let mut groups = Vec::new();
        for reservation in &used {
            if seen.contains(&reservation.id) {
                continue;
            }
            let Some(user) = self.store.find_participant(reservation.user_id).await? else {
                continue;
            };
            let Some(partner_id) = user.partner_id else {
                continue;
            };
            let Some(partner_reservation) = used.iter().find(|r| r.user_id == partner_id) else {
                continue;
            };
            let Some(partner) = self.store.find_participant(partner_id).await? else {
                continue;
            };
            seen.insert(reservation.id);
            seen.insert(partner_reservation.id);

            let timeslot = self
                .store
                .find_timeslot(reservation.timeslot_id)
                .await?
                .map(|s| s.window())
                .unwrap_or_default();
            let rating = reservation
                .interest_rating
                .or(partner_reservation.interest_rating);

            groups.push(CheckedInGroup {
                members: vec![
                    member(reservation, &user),
                    member(partner_reservation, &partner),
                ],
                timeslot,
                rating,
                rating_label: rating
                    .map(|r| r.label().to_string())
                    .unwrap_or_else(|| UNRATED_LABEL.to_string()),
            });
        }

        groups.sort_by(|a, b| b.members[0].checked_in_at.cmp(&a.members[0].checked_in_at));
        Ok(groups)
    }

    /// Sends the confirmation for the participant's active reservation again.
    pub async fn resend_confirmation(&self, email: &str) -> Result<ReservationDetails, DomainError> {
        let user = self
            .store
            .find_participant_by_email(email.trim())
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".into()))?;
        let reservation = active_reservation(self.store.as_ref(), user.id)
            .await?
            .ok_or_else(|| DomainError::NotFound("User has no active reservation".into()))?;

        let partner_name = match user.partner_id {
            Some(id) => self.store.find_participant(id).await?.map(|p| p.full_name()),
            None => None,
        };
        let details = self.details(reservation).await?;
        self.notify(&details, partner_name).await;
        Ok(details)
    }

    async fn ensure_can_book(&self, user: &Participant) -> Result<(), DomainError> {
        if !user.trivia_completed {
            return Err(DomainError::InvalidInput(format!(
                "{} must complete the trivia before booking",
                user.email
            )));
        }
        if active_reservation(self.store.as_ref(), user.id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(format!(
                "{} already has an active reservation",
                user.email
            )));
        }
        Ok(())
    }

    async fn ensure_capacity(
        &self,
        slot: &TimeSlot,
        seats: i64,
        excluding: &[Uuid],
    ) -> Result<(), DomainError> {
        let usage = self.store.list_timeslots_with_usage().await?;
        let reserved = usage
            .iter()
            .find(|u| u.slot.id == slot.id)
            .map(|u| u.reserved_count)
            .unwrap_or(0);

        let mut moving_here = 0;
        for id in excluding {
            if let Some(r) = self.store.find_reservation(*id).await? {
                if r.timeslot_id == slot.id && r.is_active() {
                    moving_here += 1;
                }
            }
        }

        if reserved - moving_here + seats > i64::from(slot.capacity) {
            return Err(DomainError::CapacityExceeded(format!(
                "Timeslot {} has no room for {} more",
                slot.window(),
                seats
            )));
        }
        Ok(())
    }

    async fn group(
        &self,
        qr_code1: &str,
        qr_code2: &str,
    ) -> Result<(Reservation, Reservation), DomainError> {
        if qr_code1 == qr_code2 {
            return Err(DomainError::InvalidInput(
                "Two different QR codes are required".into(),
            ));
        }
        let first = self.by_qr(qr_code1).await?;
        let second = self.by_qr(qr_code2).await?;
        let user = self.participant(first.user_id).await?;
        if user.partner_id != Some(second.user_id) {
            return Err(DomainError::InvalidInput(
                "QR codes do not belong to the same group".into(),
            ));
        }
        Ok((first, second))
    }

    async fn notify(&self, details: &ReservationDetails, partner_name: Option<String>) {
        let confirmation = ReservationConfirmation {
            participant_name: details.user.full_name(),
            email: details.user.email.clone(),
            whatsapp: details.user.whatsapp.clone(),
            qr_code: details.reservation.qr_code.clone(),
            date: details.timeslot.date,
            start_time: details.timeslot.start_time.clone(),
            end_time: details.timeslot.end_time.clone(),
            partner_name,
        };
        match self.notifier.send_reservation_confirmation(&confirmation).await {
            NotificationResult::Failed(reason) => warn!(
                reservation_id = %details.reservation.id,
                reason = %reason,
                "Reservation confirmation not delivered"
            ),
            NotificationResult::Sent | NotificationResult::Skipped => {}
        }
    }

    async fn details(&self, reservation: Reservation) -> Result<ReservationDetails, DomainError> {
        let user = self.participant(reservation.user_id).await?;
        let timeslot = self.timeslot(reservation.timeslot_id).await?;
        Ok(ReservationDetails {
            reservation,
            user,
            timeslot,
        })
    }

    fn new_reservation(&self, user_id: Uuid, timeslot_id: Uuid) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            user_id,
            timeslot_id,
            qr_code: self.tokens.generate(),
            status: ReservationStatus::Reserved,
            interest_rating: None,
            checked_in_at: None,
            created_at: Utc::now(),
        }
    }

    async fn participant(&self, id: Uuid) -> Result<Participant, DomainError> {
        self.store
            .find_participant(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))
    }

    async fn timeslot(&self, id: Uuid) -> Result<TimeSlot, DomainError> {
        self.store
            .find_timeslot(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Timeslot {} not found", id)))
    }

    async fn reservation(&self, id: Uuid) -> Result<Reservation, DomainError> {
        self.store
            .find_reservation(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Reservation {} not found", id)))
    }

    async fn by_qr(&self, qr_code: &str) -> Result<Reservation, DomainError> {
        self.store
            .find_reservation_by_qr(qr_code.trim())
            .await?
            .ok_or_else(|| DomainError::NotFound("Reservation not found for QR code".into()))
    }
}

fn ensure_partners(user: &Participant, partner: &Participant) -> Result<(), DomainError> {
    if user.id == partner.id || user.partner_id != Some(partner.id) {
        return Err(DomainError::InvalidInput(
            "Users are not registered as a group".into(),
        ));
    }
    Ok(())
}

fn ensure_reserved(reservation: &Reservation) -> Result<(), DomainError> {
    match reservation.status {
        ReservationStatus::Reserved => Ok(()),
        ReservationStatus::Used => Err(DomainError::AlreadyUsed(format!(
            "Reservation {} was already used",
            reservation.qr_code
        ))),
        ReservationStatus::Cancelled => Err(DomainError::Conflict(format!(
            "Reservation {} is cancelled",
            reservation.qr_code
        ))),
    }
}

fn member(reservation: &Reservation, user: &Participant) -> CheckedInMember {
    CheckedInMember {
        reservation_id: reservation.id,
        user_id: user.id,
        name: user.full_name(),
        checked_in_at: reservation.checked_in_at,
    }
}
