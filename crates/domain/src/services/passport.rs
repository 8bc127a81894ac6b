//! Event passport scan flow: entrada, entrega, completo, sorteo.
//!
//! | stage    | requires                  | one-shot |
//! |----------|---------------------------|----------|
//! | entrada  |                           | yes      |
//! | entrega  | entrada                   | yes      |
//! | completo | entrega                   | yes      |
//! | sorteo   | entrada, entrega          | yes      |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::validation::normalize_email;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::{commit_error, missing_stage_error, repeat_scan_error};
use crate::error::{DomainError, StageErrorCode};
use crate::models::passport::DEFAULT_HISTORY_LIMIT;
use crate::models::{
    HistoryEntry, HistoryQuery, NewPassportRegistration, PassportRegistration, PassportStatus,
    ScanHistory, ScanReceipt, ScanRequest, ScanStage, ScanStats, ScanValidation,
    ValidateScanRequest,
};
use crate::store::{EventStore, Guard, UnitOfWork, WriteIntent};

const MAX_HISTORY_LIMIT: i64 = 500;

/// Flag values a registration must have before `stage` can be scanned.
///
/// Prerequisites come first so an out-of-order scan reports the missing
/// stage rather than the repeat.
fn requirements(stage: ScanStage) -> &'static [(ScanStage, bool)] {
    match stage {
        ScanStage::Entrada => &[(ScanStage::Entrada, false)],
        ScanStage::Entrega => &[(ScanStage::Entrada, true), (ScanStage::Entrega, false)],
        ScanStage::Completo => &[(ScanStage::Entrega, true), (ScanStage::Completo, false)],
        ScanStage::Sorteo => &[
            (ScanStage::Entrada, true),
            (ScanStage::Entrega, true),
            (ScanStage::Sorteo, false),
        ],
    }
}

/// Checks whether `stage` may be scanned now.
pub fn scan_guard(registration: &PassportRegistration, stage: ScanStage) -> Result<(), DomainError> {
    for (required, scanned) in requirements(stage) {
        if registration.is_scanned(*required) != *scanned {
            return Err(if *scanned {
                missing_stage_error(*required)
            } else {
                repeat_scan_error(*required)
            });
        }
    }
    Ok(())
}

fn ready_message(stage: ScanStage) -> &'static str {
    match stage {
        ScanStage::Entrada => "Entrance can be registered",
        ScanStage::Entrega => "Passport can be delivered",
        ScanStage::Completo => "Passport can be marked as complete",
        ScanStage::Sorteo => "Raffle participation can be registered",
    }
}

fn done_message(stage: ScanStage) -> &'static str {
    match stage {
        ScanStage::Entrada => "Entrance registered",
        ScanStage::Entrega => "Passport delivery registered",
        ScanStage::Completo => "Passport completed",
        ScanStage::Sorteo => "Raffle participation registered",
    }
}

fn invalid_qr() -> DomainError {
    DomainError::stage(StageErrorCode::InvalidQr, "QR code is not valid or does not exist")
}

pub struct PassportService {
    store: Arc<dyn EventStore>,
}

impl PassportService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Creates a registration with every stage unset.
    pub async fn register(
        &self,
        request: NewPassportRegistration,
    ) -> Result<PassportRegistration, DomainError> {
        request.validate()?;
        let now = Utc::now();
        let registration = PassportRegistration {
            id: Uuid::new_v4(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: normalize_email(&request.email),
            phone: request.phone,
            status: PassportStatus::Pending,
            registration_date: now,
            check_in_time: None,
            entrada_scanned: false,
            entrada_time: None,
            entrega_scanned: false,
            entrega_time: None,
            completo_scanned: false,
            completo_time: None,
            sorteo_scanned: false,
            sorteo_time: None,
            created_at: now,
            updated_at: now,
        };

        self.store
            .commit(UnitOfWork::new().write(WriteIntent::InsertPassport(registration.clone())))
            .await
            .map_err(|err| match commit_error(err) {
                DomainError::Conflict(_) => {
                    DomainError::Conflict("Email is already registered".into())
                }
                other => other,
            })?;

        info!(registration_id = %registration.id, "Passport registered");
        Ok(registration)
    }

    /// Reports flags and whether `mode` could be scanned, without changing anything.
    pub async fn validate(&self, request: ValidateScanRequest) -> Result<ScanValidation, DomainError> {
        let registration = self.by_qr(&request.qr_code).await?;
        let (can_scan, message) = match scan_guard(&registration, request.mode) {
            Ok(()) => (true, ready_message(request.mode).to_string()),
            Err(err) => (false, err.message()),
        };

        Ok(ScanValidation {
            participant_id: registration.id,
            name: registration.full_name(),
            email: registration.email.clone(),
            registration_date: registration.registration_date,
            status: registration.flags(),
            can_scan,
            eligible_for_sorteo: registration.eligible_for_sorteo(),
            message,
        })
    }

    /// Records a scan of `stage`. Guards are re-checked inside the commit.
    pub async fn scan(&self, stage: ScanStage, request: ScanRequest) -> Result<ScanReceipt, DomainError> {
        let registration = self.by_qr(&request.qr_code).await?;
        if let Err(err) = scan_guard(&registration, stage) {
            debug!(
                registration_id = %registration.id,
                stage = %stage,
                code = err.code(),
                "Scan rejected"
            );
            return Err(err);
        }

        let at = request.scanned_at.unwrap_or_else(Utc::now);
        let unit = requirements(stage).iter().fold(
            UnitOfWork::new(),
            |unit, (required, scanned)| {
                unit.guard(Guard::PassportStage {
                    registration_id: registration.id,
                    stage: *required,
                    scanned: *scanned,
                })
            },
        );
        self.store
            .commit(unit.write(WriteIntent::MarkStageScanned {
                registration_id: registration.id,
                stage,
                at,
            }))
            .await
            .map_err(commit_error)?;

        info!(
            registration_id = %registration.id,
            stage = %stage,
            device_id = ?request.device_id,
            "Passport stage scanned"
        );

        Ok(ScanReceipt {
            scan_id: scan_id(at),
            participant_id: registration.id,
            name: registration.full_name(),
            mode: stage,
            timestamp: at,
            message: done_message(stage).to_string(),
        })
    }

    /// Registrations that reached `mode` (all when absent), newest first.
    pub async fn history(&self, query: HistoryQuery) -> Result<ScanHistory, DomainError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        let registrations = self.store.list_passports(query.mode, limit).await?;
        let mode = query.mode.unwrap_or(ScanStage::Entrada);

        let scans: Vec<HistoryEntry> = registrations
            .into_iter()
            .map(|reg| HistoryEntry {
                scan_id: format!("scan-{}", reg.id),
                participant_id: reg.id,
                name: reg.full_name(),
                mode,
                timestamp: query
                    .mode
                    .and_then(|m| reg.stage_time(m))
                    .unwrap_or(reg.updated_at),
                status: "valid",
            })
            .collect();

        Ok(ScanHistory {
            total: scans.len(),
            scans,
        })
    }

    pub async fn stats(&self, date: Option<String>) -> Result<ScanStats, DomainError> {
        let by_mode = self.store.passport_stage_counts().await?;
        let total_registrations = self.store.count_passports().await?;
        let total_scans = by_mode.total();
        let now = Utc::now();

        Ok(ScanStats {
            date: date.unwrap_or_else(|| now.date_naive().to_string()),
            total_registrations,
            total_scans,
            by_mode,
            valid_scans: total_scans,
            invalid_scans: 0,
            sorteo_participants: by_mode.sorteo,
            last_updated: now,
        })
    }

    async fn by_qr(&self, qr_code: &str) -> Result<PassportRegistration, DomainError> {
        let id = Uuid::parse_str(qr_code.trim()).map_err(|_| invalid_qr())?;
        self.store.find_passport(id).await?.ok_or_else(invalid_qr)
    }
}

fn scan_id(at: DateTime<Utc>) -> String {
    format!("scan-{}", at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_passport, TestStore};

    fn scan(qr: Uuid) -> ScanRequest {
        ScanRequest {
            qr_code: qr.to_string(),
            scanned_at: None,
            device_id: Some("gate-1".into()),
        }
    }

    fn code(result: Result<ScanReceipt, DomainError>) -> &'static str {
        result.unwrap_err().code()
    }

    #[tokio::test]
    async fn test_full_progression() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        let reg = seed_passport(&store, "p@x.com").await;

        for stage in ScanStage::ALL {
            let receipt = service.scan(stage, scan(reg.id)).await.unwrap();
            assert_eq!(receipt.mode, stage);
        }

        let stored = store.inner.find_passport(reg.id).await.unwrap().unwrap();
        assert!(stored.entrada_scanned && stored.entrega_scanned);
        assert!(stored.completo_scanned && stored.sorteo_scanned);
        assert_eq!(stored.status, PassportStatus::CheckedIn);
    }

    #[tokio::test]
    async fn test_out_of_order_scans() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        let reg = seed_passport(&store, "p@x.com").await;

        assert_eq!(code(service.scan(ScanStage::Entrega, scan(reg.id)).await), "NOT_ENTERED");
        assert_eq!(code(service.scan(ScanStage::Sorteo, scan(reg.id)).await), "NOT_ENTERED");
        assert_eq!(
            code(service.scan(ScanStage::Completo, scan(reg.id)).await),
            "PASSPORT_NOT_DELIVERED"
        );

        service.scan(ScanStage::Entrada, scan(reg.id)).await.unwrap();
        assert_eq!(
            code(service.scan(ScanStage::Sorteo, scan(reg.id)).await),
            "PASSPORT_NOT_DELIVERED"
        );
    }

    #[tokio::test]
    async fn test_repeat_scans() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        let reg = seed_passport(&store, "p@x.com").await;
        for stage in ScanStage::ALL {
            service.scan(stage, scan(reg.id)).await.unwrap();
        }

        assert_eq!(code(service.scan(ScanStage::Entrada, scan(reg.id)).await), "ALREADY_ENTERED");
        assert_eq!(code(service.scan(ScanStage::Entrega, scan(reg.id)).await), "ALREADY_SCANNED");
        assert_eq!(code(service.scan(ScanStage::Completo, scan(reg.id)).await), "ALREADY_SCANNED");
        assert_eq!(
            code(service.scan(ScanStage::Sorteo, scan(reg.id)).await),
            "ALREADY_PARTICIPATED"
        );

        // Nothing reverted.
        let stored = store.inner.find_passport(reg.id).await.unwrap().unwrap();
        assert!(ScanStage::ALL.iter().all(|s| stored.is_scanned(*s)));
    }

    #[tokio::test]
    async fn test_sorteo_without_completo() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        let reg = seed_passport(&store, "p@x.com").await;
        service.scan(ScanStage::Entrada, scan(reg.id)).await.unwrap();
        service.scan(ScanStage::Entrega, scan(reg.id)).await.unwrap();
        assert!(service.scan(ScanStage::Sorteo, scan(reg.id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_client_timestamp_is_kept() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        let reg = seed_passport(&store, "p@x.com").await;
        let at = DateTime::parse_from_rfc3339("2026-02-27T15:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let receipt = service
            .scan(
                ScanStage::Entrada,
                ScanRequest {
                    qr_code: reg.id.to_string(),
                    scanned_at: Some(at),
                    device_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.timestamp, at);
        let stored = store.inner.find_passport(reg.id).await.unwrap().unwrap();
        assert_eq!(stored.entrada_time, Some(at));
        assert_eq!(stored.check_in_time, Some(at));
    }

    #[tokio::test]
    async fn test_invalid_qr() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        assert_eq!(
            code(
                service
                    .scan(
                        ScanStage::Entrada,
                        ScanRequest {
                            qr_code: "not-a-uuid".into(),
                            scanned_at: None,
                            device_id: None,
                        },
                    )
                    .await
            ),
            "INVALID_QR"
        );
        assert_eq!(
            code(service.scan(ScanStage::Entrada, scan(Uuid::new_v4())).await),
            "INVALID_QR"
        );
    }

    #[tokio::test]
    async fn test_validate_does_not_mutate() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        let reg = seed_passport(&store, "p@x.com").await;

        let check = service
            .validate(ValidateScanRequest {
                qr_code: reg.id.to_string(),
                mode: ScanStage::Entrega,
            })
            .await
            .unwrap();
        assert!(!check.can_scan);
        assert!(!check.eligible_for_sorteo);

        service.scan(ScanStage::Entrada, scan(reg.id)).await.unwrap();
        service.scan(ScanStage::Entrega, scan(reg.id)).await.unwrap();
        let check = service
            .validate(ValidateScanRequest {
                qr_code: reg.id.to_string(),
                mode: ScanStage::Sorteo,
            })
            .await
            .unwrap();
        assert!(check.can_scan);
        assert!(check.eligible_for_sorteo);
        assert!(check.status.entrada && check.status.entrega && !check.status.sorteo);

        let stored = store.inner.find_passport(reg.id).await.unwrap().unwrap();
        assert!(!stored.sorteo_scanned);
    }

    #[tokio::test]
    async fn test_history_and_stats() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        let first = seed_passport(&store, "one@x.com").await;
        let second = seed_passport(&store, "two@x.com").await;
        seed_passport(&store, "three@x.com").await;

        service.scan(ScanStage::Entrada, scan(first.id)).await.unwrap();
        service.scan(ScanStage::Entrada, scan(second.id)).await.unwrap();
        service.scan(ScanStage::Entrega, scan(second.id)).await.unwrap();
        service.scan(ScanStage::Sorteo, scan(second.id)).await.unwrap();

        let entradas = service
            .history(HistoryQuery {
                mode: Some(ScanStage::Entrada),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entradas.total, 2);

        let limited = service
            .history(HistoryQuery {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.total, 1);

        let stats = service.stats(Some("2026-02-27".into())).await.unwrap();
        assert_eq!(stats.total_registrations, 3);
        assert_eq!(stats.by_mode.entrada, 2);
        assert_eq!(stats.by_mode.entrega, 1);
        assert_eq!(stats.total_scans, 4);
        assert_eq!(stats.sorteo_participants, 1);
        assert_eq!(stats.date, "2026-02-27");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = TestStore::new();
        let service = PassportService::new(store.port());
        let request = NewPassportRegistration {
            first_name: "Luis".into(),
            last_name: "Mora".into(),
            email: "luis@x.com".into(),
            phone: "0991112222".into(),
        };
        let reg = service.register(request.clone()).await.unwrap();
        assert_eq!(reg.status, PassportStatus::Pending);
        assert!(matches!(
            service.register(request).await,
            Err(DomainError::Conflict(_))
        ));
    }
}
