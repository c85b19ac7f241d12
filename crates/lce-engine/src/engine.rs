//! # License Engine
//!
//! The public surface of the licensing protocol. Each operation:
//!
//! 1. looks up the license (`NotFound`),
//! 2. locks the record and runs the state machine transition, which checks
//!    every guard before mutating,
//! 3. releases the lock,
//! 4. for withdrawals, pays the approved tranche through the [`Treasury`],
//!    then re-locks to record the release, or to drop the payout if the
//!    treasury refused,
//! 5. emits events.
//!
//! No lock is held while the treasury or the event sink runs, so either may
//! call back into the engine. While the treasury runs, the record shows the
//! payout as in flight: the tranche is still held, and competing withdrawals
//! and dispute steps fail with a retryable `WrongState`.

use std::sync::Arc;

use lce_arbitration::{BreachFeeDisposition, BreachResolver, DisputeWindows, Release, ReleaseKind};
use lce_core::{Address, Amount, CallContext, LicenseId, Timestamp};
use lce_state::{License, LicenseError, LicenseTerms, Operation, Payout, Role};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::{EventSink, LicenseEvent, Transfer, TransferKind};
use crate::registry::{LicenseHandle, LicenseRegistry};
use crate::treasury::Treasury;

/// Licensing-agreement engine.
pub struct LicenseEngine {
    registry: LicenseRegistry,
    resolver: BreachResolver,
    treasury: Arc<dyn Treasury>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for LicenseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseEngine")
            .field("licenses", &self.registry.len())
            .field("windows", self.resolver.windows())
            .finish_non_exhaustive()
    }
}

impl LicenseEngine {
    /// Build an engine from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `config` fails validation.
    pub fn new(
        config: &EngineConfig,
        treasury: Arc<dyn Treasury>,
        sink: Arc<dyn EventSink>,
    ) -> EngineResult<Self> {
        config.ensure_valid()?;
        Ok(Self::from_parts(config.windows, treasury, sink))
    }

    /// Build an engine with the default dispute windows.
    pub fn with_defaults(treasury: Arc<dyn Treasury>, sink: Arc<dyn EventSink>) -> Self {
        Self::from_parts(DisputeWindows::default(), treasury, sink)
    }

    fn from_parts(
        windows: DisputeWindows,
        treasury: Arc<dyn Treasury>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        tracing::info!(
            breach_claim_window_secs = windows.breach_claim_window_secs,
            return_grace_window_secs = windows.return_grace_window_secs,
            "license engine started"
        );
        Self {
            registry: LicenseRegistry::new(),
            resolver: BreachResolver::new(windows),
            treasury,
            sink,
        }
    }

    /// The dispute windows in force.
    pub fn windows(&self) -> &DisputeWindows {
        self.resolver.windows()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Create a Draft license with the caller as licensor.
    pub fn new_license(&self, ctx: &CallContext, terms: LicenseTerms) -> EngineResult<LicenseId> {
        let work_hash = terms.work_hash;
        // Placeholder id until the terms are accepted, so rejected terms do
        // not consume an identifier.
        let license = License::create(LicenseId(0), terms, ctx).map_err(|e| {
            tracing::debug!(caller = %ctx.caller, error = %e, "new_license rejected");
            EngineError::from(e)
        })?;
        let id = self.registry.register(license);

        self.committed(id, Operation::NewLicense, ctx);
        self.sink.emit(&LicenseEvent::Created {
            license_id: id,
            licensor: ctx.caller,
            work_hash,
            at: ctx.now,
        });
        Ok(id)
    }

    /// Name or replace the arbiter.
    pub fn set_arbiter(&self, ctx: &CallContext, id: LicenseId, arbiter: Address) -> EngineResult<()> {
        let op = Operation::SetArbiter;
        let handle = self.handle(id)?;
        self.locked(&handle, id, op, ctx, |l| l.set_arbiter(ctx, arbiter))?;
        self.committed(id, op, ctx);
        self.sink.emit(&LicenseEvent::ArbiterSet {
            license_id: id,
            arbiter,
            at: ctx.now,
        });
        Ok(())
    }

    /// Sign the license for `licensee`, paying `payment` into escrow.
    pub fn sign_license(
        &self,
        ctx: &CallContext,
        id: LicenseId,
        licensee: Address,
        payment: Amount,
    ) -> EngineResult<()> {
        let op = Operation::SignLicense;
        let handle = self.handle(id)?;
        self.locked(&handle, id, op, ctx, |l| l.sign(ctx, licensee, payment))?;
        tracing::info!(
            license_id = %id,
            caller = %ctx.caller,
            licensee = %licensee,
            amount = payment.units(),
            "license signed, deposit escrowed"
        );
        self.sink.emit(&LicenseEvent::Signed {
            license_id: id,
            licensee,
            at: ctx.now,
        });
        self.sink.emit(&LicenseEvent::Transfer(Transfer {
            license_id: id,
            from: Role::Licensee,
            to: Role::Escrow,
            amount: payment,
            kind: TransferKind::Deposit,
        }));
        Ok(())
    }

    /// Grant secondary rights. Returns the sublicensee's index.
    pub fn add_sublicensee(&self, ctx: &CallContext, id: LicenseId, address: Address) -> EngineResult<usize> {
        let op = Operation::AddSublicensee;
        let handle = self.handle(id)?;
        let index = self.locked(&handle, id, op, ctx, |l| l.add_sublicensee(ctx, address))?;
        self.committed(id, op, ctx);
        self.sink.emit(&LicenseEvent::SublicenseeAdded {
            license_id: id,
            sublicensee: address,
            index,
        });
        Ok(index)
    }

    /// Pay the license fee to the licensor.
    pub fn withdraw_license_fee(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<Transfer> {
        let op = Operation::WithdrawLicenseFee;
        let handle = self.handle(id)?;
        let payout = self.locked(&handle, id, op, ctx, |l| l.withdraw_license_fee(ctx))?;
        self.pay_out(&handle, id, op, ctx, payout)
    }

    /// Mark the work as commissioned.
    pub fn commission_comments(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<()> {
        let op = Operation::CommissionComments;
        let handle = self.handle(id)?;
        self.locked(&handle, id, op, ctx, |l| l.commission_comments(ctx))?;
        self.committed(id, op, ctx);
        self.sink.emit(&LicenseEvent::CommentsCommissioned { license_id: id });
        Ok(())
    }

    /// Approve publication.
    pub fn grant_approval(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<()> {
        let op = Operation::GrantApproval;
        let handle = self.handle(id)?;
        self.locked(&handle, id, op, ctx, |l| l.grant_approval(ctx))?;
        self.committed(id, op, ctx);
        self.sink.emit(&LicenseEvent::ApprovalGranted {
            license_id: id,
            at: ctx.now,
        });
        Ok(())
    }

    /// Raise an unauthorized-publication notice at the current time.
    pub fn set_unauthorized_publication(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<()> {
        let op = Operation::SetUnauthorizedPublication;
        let handle = self.handle(id)?;
        self.locked(&handle, id, op, ctx, |l| l.set_unauthorized_publication(ctx))?;
        self.committed(id, op, ctx);
        self.sink.emit(&LicenseEvent::UnauthorizedPublication {
            license_id: id,
            notified_at: ctx.now,
        });
        Ok(())
    }

    /// Clear the outstanding notice.
    pub fn declare_removed(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<()> {
        let op = Operation::DeclareRemoved;
        let handle = self.handle(id)?;
        self.locked(&handle, id, op, ctx, |l| l.declare_removed(ctx))?;
        self.committed(id, op, ctx);
        self.sink.emit(&LicenseEvent::RemovalDeclared {
            license_id: id,
            at: ctx.now,
        });
        Ok(())
    }

    /// Declare the licensee in breach.
    pub fn declare_breach(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<()> {
        let op = Operation::DeclareBreach;
        let handle = self.handle(id)?;
        self.locked(&handle, id, op, ctx, |l| l.declare_breach(ctx, &self.resolver))?;
        self.committed(id, op, ctx);
        self.sink.emit(&LicenseEvent::BreachDeclared {
            license_id: id,
            at: ctx.now,
        });
        Ok(())
    }

    /// Pay the forfeited breach fee to the licensor.
    pub fn withdraw_breach_fee(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<Transfer> {
        let op = Operation::WithdrawBreachFee;
        let handle = self.handle(id)?;
        let payout = self.locked(&handle, id, op, ctx, |l| l.withdraw_breach_fee(ctx, &self.resolver))?;
        self.pay_out(&handle, id, op, ctx, payout)
    }

    /// Return the breach fee to the licensee.
    pub fn return_breach_fee(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<Transfer> {
        let op = Operation::ReturnBreachFee;
        let handle = self.handle(id)?;
        let payout = self.locked(&handle, id, op, ctx, |l| l.return_breach_fee(ctx, &self.resolver))?;
        self.pay_out(&handle, id, op, ctx, payout)
    }

    /// Whether the license is active at `ctx.now`.
    pub fn license_activation_status(&self, ctx: &CallContext, id: LicenseId) -> EngineResult<bool> {
        let handle = self.handle(id)?;
        let active = handle.lock().is_active(ctx.now, &self.resolver);
        Ok(active)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// A copy of the license record.
    pub fn license(&self, id: LicenseId) -> EngineResult<License> {
        self.registry.snapshot(id).ok_or(EngineError::NotFound(id))
    }

    /// The sublicensee at `index`.
    pub fn sublicensee(&self, id: LicenseId, index: usize) -> EngineResult<Address> {
        let handle = self.handle(id)?;
        let address = handle.lock().sublicensee(index)?;
        Ok(address)
    }

    /// All sublicensees in grant order.
    pub fn sublicensees(&self, id: LicenseId) -> EngineResult<Vec<Address>> {
        let handle = self.handle(id)?;
        let list = handle.lock().sublicensees.as_slice().to_vec();
        Ok(list)
    }

    /// Number of licenses created.
    pub fn license_count(&self) -> usize {
        self.registry.len()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn handle(&self, id: LicenseId) -> EngineResult<LicenseHandle> {
        self.registry.get(id).ok_or(EngineError::NotFound(id))
    }

    /// Run `f` on the locked record. The lock is released on return.
    fn locked<T>(
        &self,
        handle: &LicenseHandle,
        id: LicenseId,
        op: Operation,
        ctx: &CallContext,
        f: impl FnOnce(&mut License) -> Result<T, LicenseError>,
    ) -> EngineResult<T> {
        let mut license = handle.lock();
        f(&mut license).map_err(|e| {
            tracing::debug!(
                license_id = %id,
                operation = %op,
                caller = %ctx.caller,
                kind = %e.kind(),
                error = %e,
                "operation rejected"
            );
            EngineError::from(e)
        })
    }

    fn committed(&self, id: LicenseId, op: Operation, ctx: &CallContext) {
        tracing::info!(license_id = %id, operation = %op, caller = %ctx.caller, "operation committed");
    }

    /// Pay an approved payout. Called with no lock held.
    fn pay_out(
        &self,
        handle: &LicenseHandle,
        id: LicenseId,
        op: Operation,
        ctx: &CallContext,
        payout: Payout,
    ) -> EngineResult<Transfer> {
        let amount = payout.amount();
        let pending = InFlight::new(handle, payout);
        if let Err(refusal) = self.treasury.pay(id, payout.payee, amount) {
            tracing::error!(
                license_id = %id,
                operation = %op,
                payee = %payout.payee,
                amount = amount.units(),
                error = %refusal,
                "payout refused, tranche stays in escrow"
            );
            pending.abandon();
            return Err(EngineError::TransferFailed {
                license_id: id,
                operation: op,
                payee: payout.payee,
                amount,
                source: refusal,
            });
        }

        let release = pending.complete(ctx.now, op).map_err(|e| {
            tracing::error!(license_id = %id, operation = %op, error = %e, "paid payout not recorded");
            EngineError::PayoutNotRecorded {
                license_id: id,
                operation: op,
                source: e,
            }
        })?;
        let transfer = Transfer {
            license_id: id,
            from: Role::Escrow,
            to: payout.payee_role,
            amount,
            kind: transfer_kind(payout.kind),
        };
        tracing::info!(
            license_id = %id,
            operation = %op,
            payee = %payout.payee,
            amount = amount.units(),
            transaction = %release.transaction_id,
            "payout completed"
        );
        self.sink.emit(&LicenseEvent::Transfer(transfer));
        Ok(transfer)
    }
}

/// A payout between approval and resolution. Dropping it unresolved, as when
/// the treasury panics, abandons the payout so the license is not left
/// blocked.
struct InFlight<'a> {
    handle: &'a LicenseHandle,
    payout: Payout,
    resolved: bool,
}

impl<'a> InFlight<'a> {
    fn new(handle: &'a LicenseHandle, payout: Payout) -> Self {
        Self {
            handle,
            payout,
            resolved: false,
        }
    }

    fn complete(mut self, at: Timestamp, op: Operation) -> Result<Release, LicenseError> {
        self.resolved = true;
        self.handle.lock().complete_payout(&self.payout, at, op)
    }

    fn abandon(mut self) {
        self.resolved = true;
        self.handle.lock().abandon_payout(&self.payout);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.handle.lock().abandon_payout(&self.payout);
        }
    }
}

fn transfer_kind(kind: ReleaseKind) -> TransferKind {
    match kind {
        ReleaseKind::LicenseFee => TransferKind::LicenseFee,
        ReleaseKind::BreachFee(BreachFeeDisposition::ToLicensor) => TransferKind::BreachFeeForfeit,
        ReleaseKind::BreachFee(BreachFeeDisposition::ToLicensee) => TransferKind::BreachFeeReturn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    use lce_core::{ErrorKind, Timestamp, WorkHash};
    use lce_state::LicenseState;

    use crate::events::EventLog;
    use crate::treasury::{InMemoryTreasury, TreasuryError};

    fn licensor() -> Address {
        Address::from_bytes([0x16; 20])
    }
    fn licensee() -> Address {
        Address::from_bytes([0x81; 20])
    }
    fn arbiter() -> Address {
        Address::from_bytes([0xa1; 20])
    }

    fn ctx(caller: Address, secs: i64) -> CallContext {
        CallContext::new(caller, Timestamp::from_epoch_secs(secs).unwrap())
    }

    fn terms() -> LicenseTerms {
        LicenseTerms::new(
            WorkHash::of_content(b"manuscript"),
            Amount::new(1),
            Amount::new(2),
            60,
            Timestamp::from_epoch_secs(1_000).unwrap(),
            Timestamp::from_epoch_secs(10_000).unwrap(),
        )
        .with_arbiter(arbiter())
    }

    fn make_engine() -> (LicenseEngine, Arc<InMemoryTreasury>, Arc<EventLog>) {
        let treasury = Arc::new(InMemoryTreasury::new());
        let log = Arc::new(EventLog::new());
        let engine = LicenseEngine::with_defaults(treasury.clone(), log.clone());
        (engine, treasury, log)
    }

    fn make_signed(engine: &LicenseEngine) -> LicenseId {
        let id = engine.new_license(&ctx(licensor(), 1_000), terms()).unwrap();
        engine
            .sign_license(&ctx(licensee(), 1_000), id, licensee(), Amount::new(3))
            .unwrap();
        id
    }

    // ── Creation and lookup ──────────────────────────────────────────

    #[test]
    fn ids_are_sequential_and_skip_nothing_on_rejection() {
        let (engine, _, _) = make_engine();
        let a = engine.new_license(&ctx(licensor(), 0), terms()).unwrap();
        let mut bad = terms();
        bad.license_breached = true;
        assert!(engine.new_license(&ctx(licensor(), 0), bad).is_err());
        let b = engine.new_license(&ctx(licensor(), 0), terms()).unwrap();
        assert_eq!(a, LicenseId(1));
        assert_eq!(b, LicenseId(2));
        assert_eq!(engine.license_count(), 2);
    }

    #[test]
    fn unknown_license_is_not_found() {
        let (engine, _, _) = make_engine();
        let err = engine.declare_breach(&ctx(arbiter(), 0), LicenseId(7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(engine.license(LicenseId(7)).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            engine
                .license_activation_status(&ctx(arbiter(), 0), LicenseId(7))
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.windows.return_grace_window_secs = 0;
        let err = LicenseEngine::new(
            &config,
            Arc::new(InMemoryTreasury::new()),
            Arc::new(EventLog::new()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    // ── Events ───────────────────────────────────────────────────────

    #[test]
    fn signing_emits_deposit_transfer() {
        let (engine, _, log) = make_engine();
        let id = make_signed(&engine);
        let events = log.for_license(id);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].name(), "created");
        assert_eq!(events[1].name(), "signed");
        assert_eq!(
            events[2],
            LicenseEvent::Transfer(Transfer {
                license_id: id,
                from: Role::Licensee,
                to: Role::Escrow,
                amount: Amount::new(3),
                kind: TransferKind::Deposit,
            })
        );
    }

    #[test]
    fn rejected_operation_emits_nothing() {
        let (engine, _, log) = make_engine();
        let id = make_signed(&engine);
        let before = log.len();
        let err = engine.grant_approval(&ctx(licensee(), 1_001), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(log.len(), before);
    }

    // ── Payouts ──────────────────────────────────────────────────────

    #[test]
    fn license_fee_paid_through_treasury() {
        let (engine, treasury, log) = make_engine();
        let id = make_signed(&engine);
        let transfer = engine.withdraw_license_fee(&ctx(licensor(), 1_001), id).unwrap();
        assert_eq!(transfer.amount, Amount::new(1));
        assert_eq!(transfer.kind, TransferKind::LicenseFee);
        assert_eq!(treasury.balance_of(&licensor()), Amount::new(1));
        assert_eq!(log.transfers().len(), 2);

        let err = engine.withdraw_license_fee(&ctx(licensor(), 1_002), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadySettled);
        assert_eq!(treasury.balance_of(&licensor()), Amount::new(1));
    }

    #[test]
    fn refused_payout_leaves_tranche_held_and_retryable() {
        let (engine, treasury, log) = make_engine();
        let id = make_signed(&engine);
        treasury.freeze(licensor());
        let transfers_before = log.transfers().len();

        let err = engine.withdraw_license_fee(&ctx(licensor(), 1_001), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferFailed);
        let lic = engine.license(id).unwrap();
        assert!(!lic.license_fee_withdrawn());
        assert_eq!(lic.escrow.held(), Amount::new(3));
        assert_eq!(lic.escrow.transactions().len(), 1);
        assert_eq!(lic.payout_in_flight, None);
        assert_eq!(log.transfers().len(), transfers_before);

        treasury.unfreeze(&licensor());
        engine.withdraw_license_fee(&ctx(licensor(), 1_002), id).unwrap();
        assert_eq!(treasury.balance_of(&licensor()), Amount::new(1));
    }

    #[test]
    fn refused_final_payout_never_settles_license() {
        let (engine, treasury, _) = make_engine();
        let id = make_signed(&engine);
        engine.withdraw_license_fee(&ctx(licensor(), 1_001), id).unwrap();
        treasury.freeze(licensee());

        // Signed at 1_000 with a 60 s takedown period.
        let opens = 1_060 + engine.windows().return_grace_window_secs as i64;
        let err = engine
            .return_breach_fee(&ctx(licensee(), opens), id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferFailed);
        let lic = engine.license(id).unwrap();
        assert_eq!(lic.state, LicenseState::Signed);
        assert!(!lic.breach_fee_settled());
        assert!(lic.transitions.iter().all(|t| t.to_state != LicenseState::Settled));
    }

    /// What a treasury saw when it called back into the engine mid-payout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Observed {
        withdrawn: bool,
        held: Amount,
        in_flight: bool,
        second_withdrawal: ErrorKind,
    }

    /// Treasury that reads the license back and tries a second withdrawal
    /// from inside `pay`, then accepts or refuses the payment.
    struct ReentrantTreasury {
        engine: OnceLock<Arc<LicenseEngine>>,
        refuse: bool,
        observed: parking_lot::Mutex<Option<Observed>>,
    }

    impl ReentrantTreasury {
        fn wired(refuse: bool) -> (Arc<Self>, Arc<LicenseEngine>) {
            let treasury = Arc::new(Self {
                engine: OnceLock::new(),
                refuse,
                observed: parking_lot::Mutex::new(None),
            });
            let engine = Arc::new(LicenseEngine::with_defaults(
                treasury.clone(),
                Arc::new(EventLog::new()),
            ));
            assert!(treasury.engine.set(Arc::clone(&engine)).is_ok());
            (treasury, engine)
        }
    }

    impl Treasury for ReentrantTreasury {
        fn pay(&self, license_id: LicenseId, payee: Address, _amount: Amount) -> Result<(), TreasuryError> {
            let rejected = |reason: String| TreasuryError::Rejected { payee, reason };
            let engine = self
                .engine
                .get()
                .ok_or_else(|| rejected("engine not wired".to_string()))?;
            let lic = engine.license(license_id).map_err(|e| rejected(e.to_string()))?;
            let second_withdrawal = match engine.withdraw_license_fee(&ctx(licensor(), 1_001), license_id) {
                Ok(_) => return Err(rejected("second withdrawal succeeded".to_string())),
                Err(e) => e.kind(),
            };
            *self.observed.lock() = Some(Observed {
                withdrawn: lic.license_fee_withdrawn(),
                held: lic.escrow.held(),
                in_flight: lic.payout_in_flight.is_some(),
                second_withdrawal,
            });
            if self.refuse {
                return Err(rejected("refused after re-entry".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn reentrant_treasury_sees_payout_in_flight() {
        let (treasury, engine) = ReentrantTreasury::wired(false);
        let id = make_signed(&engine);
        engine.withdraw_license_fee(&ctx(licensor(), 1_001), id).unwrap();

        assert_eq!(
            *treasury.observed.lock(),
            Some(Observed {
                withdrawn: false,
                held: Amount::new(3),
                in_flight: true,
                second_withdrawal: ErrorKind::WrongState,
            })
        );
        let lic = engine.license(id).unwrap();
        assert!(lic.license_fee_withdrawn());
        assert_eq!(lic.payout_in_flight, None);
        assert_eq!(lic.escrow.held(), Amount::new(2));
    }

    #[test]
    fn refused_payout_after_reentry_is_never_seen_as_paid() {
        let (treasury, engine) = ReentrantTreasury::wired(true);
        let id = make_signed(&engine);
        let err = engine.withdraw_license_fee(&ctx(licensor(), 1_001), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferFailed);

        // The inner call was told to retry, not that the fee was gone.
        let observed = (*treasury.observed.lock()).unwrap();
        assert!(!observed.withdrawn);
        assert_eq!(observed.second_withdrawal, ErrorKind::WrongState);

        let lic = engine.license(id).unwrap();
        assert!(!lic.license_fee_withdrawn());
        assert_eq!(lic.payout_in_flight, None);
        assert_eq!(lic.escrow.held(), Amount::new(3));
    }

    /// Treasury that panics instead of answering.
    struct PanickingTreasury;

    impl Treasury for PanickingTreasury {
        fn pay(&self, _license_id: LicenseId, _payee: Address, _amount: Amount) -> Result<(), TreasuryError> {
            panic!("treasury crashed");
        }
    }

    #[test]
    fn panicking_treasury_does_not_leave_payout_in_flight() {
        let engine = LicenseEngine::with_defaults(Arc::new(PanickingTreasury), Arc::new(EventLog::new()));
        let id = make_signed(&engine);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.withdraw_license_fee(&ctx(licensor(), 1_001), id)
        }));
        assert!(outcome.is_err());

        let lic = engine.license(id).unwrap();
        assert_eq!(lic.payout_in_flight, None);
        assert!(!lic.license_fee_withdrawn());
        engine.set_unauthorized_publication(&ctx(licensor(), 1_002), id).unwrap();
    }

    // ── Queries ──────────────────────────────────────────────────────

    #[test]
    fn sublicensee_queries() {
        let (engine, _, _) = make_engine();
        let id = make_signed(&engine);
        let s1 = Address::from_bytes([0x01; 20]);
        let s2 = Address::from_bytes([0x02; 20]);
        assert_eq!(engine.add_sublicensee(&ctx(licensee(), 1_001), id, s1).unwrap(), 0);
        assert_eq!(engine.add_sublicensee(&ctx(licensee(), 1_002), id, s2).unwrap(), 1);
        assert_eq!(engine.sublicensee(id, 1).unwrap(), s2);
        assert_eq!(engine.sublicensees(id).unwrap(), vec![s1, s2]);
        assert_eq!(engine.sublicensee(id, 2).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn activation_status_follows_term() {
        let (engine, _, _) = make_engine();
        let id = make_signed(&engine);
        assert!(engine.license_activation_status(&ctx(arbiter(), 5_000), id).unwrap());
        assert!(!engine.license_activation_status(&ctx(arbiter(), 10_001), id).unwrap());
    }
}
