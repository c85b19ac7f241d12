//! # License Agreement State Machine
//!
//! Models one bilateral content-licensing agreement: a licensor, a licensee
//! established at signing, an optional arbiter, an escrowed deposit split
//! into a license fee and a breach fee, and the unauthorized-publication
//! dispute protocol.
//!
//! ## Guard Order
//!
//! Every transition checks, in this order, before mutating anything:
//!
//! 1. caller role (`Unauthorized`)
//! 2. no payout in flight, for withdrawals and dispute steps (`WrongState`)
//! 3. one-shot replay of a withdrawal (`AlreadySettled`)
//! 4. lifecycle state (`WrongState`)
//! 5. deposit amount (`WrongDepositAmount`)
//! 6. time gate (`TooEarly`)
//!
//! ## Payouts
//!
//! Payouts are two-phase. A withdrawal method checks its guards, marks the
//! tranche as in flight and returns a [`Payout`]; the escrow is untouched.
//! The caller pays outside the record lock and then either
//! [`complete_payout`](License::complete_payout)s, which records the release,
//! or [`abandon_payout`](License::abandon_payout)s, which clears the marker.
//! While a payout is in flight, other withdrawals and dispute steps on the
//! same license fail with `WrongState` and may be retried.

use lce_arbitration::{
    ArbitrationError, BreachFeeDisposition, BreachResolver, DisputeTimeline, EscrowAccount,
    Release, ReleaseKind,
};
use lce_core::{Address, Amount, CallContext, LicenseId, Timestamp, WorkHash};
use serde::{Deserialize, Serialize};

use crate::error::LicenseError;
use crate::sublicense::SublicenseeRegistry;

// ─── License State ───────────────────────────────────────────────────

/// The lifecycle state of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseState {
    /// Created, not yet signed.
    Draft,
    /// Signed and funded, no unauthorized publication outstanding.
    Signed,
    /// An unauthorized-publication notice is outstanding.
    Disputed,
    /// Every escrowed fee has been paid out (terminal).
    Settled,
}

impl LicenseState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled)
    }
}

impl std::fmt::Display for LicenseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Signed => "SIGNED",
            Self::Disputed => "DISPUTED",
            Self::Settled => "SETTLED",
        };
        f.write_str(s)
    }
}

// ─── Roles and Operations ────────────────────────────────────────────

/// A party's role with respect to one license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creator of the license.
    Licensor,
    /// Party established at signing.
    Licensee,
    /// Neutral party that clears or declares breaches.
    Arbiter,
    /// The escrow holding the deposit.
    Escrow,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Licensor => "licensor",
            Self::Licensee => "licensee",
            Self::Arbiter => "arbiter",
            Self::Escrow => "escrow",
        };
        f.write_str(s)
    }
}

/// The public operations of the license protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    NewLicense,
    SetArbiter,
    SignLicense,
    AddSublicensee,
    WithdrawLicenseFee,
    CommissionComments,
    GrantApproval,
    SetUnauthorizedPublication,
    DeclareRemoved,
    DeclareBreach,
    WithdrawBreachFee,
    ReturnBreachFee,
}

impl Operation {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewLicense => "new_license",
            Self::SetArbiter => "set_arbiter",
            Self::SignLicense => "sign_license",
            Self::AddSublicensee => "add_sublicensee",
            Self::WithdrawLicenseFee => "withdraw_license_fee",
            Self::CommissionComments => "commission_comments",
            Self::GrantApproval => "grant_approval",
            Self::SetUnauthorizedPublication => "set_unauthorized_publication",
            Self::DeclareRemoved => "declare_removed",
            Self::DeclareBreach => "declare_breach",
            Self::WithdrawBreachFee => "withdraw_breach_fee",
            Self::ReturnBreachFee => "return_breach_fee",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Creation Terms ──────────────────────────────────────────────────

/// Parameters of `new_license`.
///
/// The dispute fields (`publication_is_approved`, `unauthorized_publication`,
/// `time_of_notification`, `license_breached`) are part of the creation
/// surface but must be in their initial state; only the protocol itself may
/// raise them later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTerms {
    /// Fingerprint of the licensed work.
    pub work_hash: WorkHash,
    /// Paid to the licensor from escrow.
    pub license_fee: Amount,
    /// Security against unauthorized publication.
    pub breach_fee: Amount,
    /// Whether the work was commissioned.
    pub is_commissioned: bool,
    /// Must be `false` at creation.
    pub publication_is_approved: bool,
    /// Must be `false` at creation.
    pub unauthorized_publication: bool,
    /// Takedown grace period after a notice, in seconds.
    pub time_to_remove_secs: u64,
    /// Must be `None` at creation.
    pub time_of_notification: Option<Timestamp>,
    /// Must be `false` at creation.
    pub license_breached: bool,
    /// Start of the license term.
    pub start_date: Timestamp,
    /// End of the license term; must be after `start_date`.
    pub end_date: Timestamp,
    /// Arbiter named up front, if any.
    pub arbiter: Option<Address>,
}

impl LicenseTerms {
    /// Terms with every flag in its initial state and no arbiter.
    pub fn new(
        work_hash: WorkHash,
        license_fee: Amount,
        breach_fee: Amount,
        time_to_remove_secs: u64,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Self {
        Self {
            work_hash,
            license_fee,
            breach_fee,
            is_commissioned: false,
            publication_is_approved: false,
            unauthorized_publication: false,
            time_to_remove_secs,
            time_of_notification: None,
            license_breached: false,
            start_date,
            end_date,
            arbiter: None,
        }
    }

    /// Name the arbiter at creation.
    pub fn with_arbiter(mut self, arbiter: Address) -> Self {
        self.arbiter = Some(arbiter);
        self
    }

    /// Mark the work as commissioned at creation.
    pub fn commissioned(mut self) -> Self {
        self.is_commissioned = true;
        self
    }

    /// Check the terms for a license created by `licensor`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidTerms`] for a zero work hash, a term
    /// that does not end after it starts, dispute fields that are not in
    /// their initial state, or an arbiter equal to the licensor.
    pub fn validate(&self, licensor: &Address) -> Result<(), LicenseError> {
        let invalid = |reason: &str| {
            Err(LicenseError::InvalidTerms {
                reason: reason.to_string(),
            })
        };
        if self.work_hash.is_zero() {
            return invalid("work hash must not be zero");
        }
        if self.start_date >= self.end_date {
            return Err(LicenseError::InvalidTerms {
                reason: format!(
                    "start date {} must be before end date {}",
                    self.start_date, self.end_date
                ),
            });
        }
        if self.publication_is_approved {
            return invalid("publication can only be approved after signing");
        }
        if self.unauthorized_publication || self.time_of_notification.is_some() {
            return invalid("unauthorized publication can only be raised after signing");
        }
        if self.license_breached {
            return invalid("breach can only be declared by the arbiter after signing");
        }
        if self.arbiter.as_ref() == Some(licensor) {
            return invalid("arbiter must differ from the licensor");
        }
        Ok(())
    }
}

// ─── Transition Records ──────────────────────────────────────────────

/// Record of a license state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTransitionRecord {
    /// State before the transition.
    pub from_state: LicenseState,
    /// State after the transition.
    pub to_state: LicenseState,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// The operation that caused it.
    pub operation: Operation,
}

/// A tranche approved for payment but not yet recorded as released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// The tranche being paid.
    pub kind: ReleaseKind,
    /// The tranche amount.
    pub amount: Amount,
    /// Who receives the funds.
    pub payee: Address,
    /// The payee's role.
    pub payee_role: Role,
}

impl Payout {
    /// The amount to pay.
    pub fn amount(&self) -> Amount {
        self.amount
    }
}

// ─── License ─────────────────────────────────────────────────────────

/// A license agreement with its escrow, sublicensees, and lifecycle history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Registry-assigned identifier.
    pub id: LicenseId,
    /// Creator; immutable.
    pub licensor: Address,
    /// Set exactly once, at signing.
    pub licensee: Option<Address>,
    /// Clears or declares breaches.
    pub arbiter: Option<Address>,
    /// Fingerprint of the licensed work.
    pub work_hash: WorkHash,
    /// Whether the work was commissioned.
    pub is_commissioned: bool,
    /// Set by the licensor after signing.
    pub publication_is_approved: bool,
    /// An unauthorized-publication notice is outstanding.
    pub unauthorized_publication: bool,
    /// Takedown grace period, in seconds.
    pub time_to_remove_secs: u64,
    /// When the outstanding notice was raised.
    pub time_of_notification: Option<Timestamp>,
    /// Set by the arbiter once the removal deadline passed.
    pub license_breached: bool,
    /// When the breach was declared.
    pub breach_declared_at: Option<Timestamp>,
    /// Start of the license term.
    pub start_date: Timestamp,
    /// End of the license term.
    pub end_date: Timestamp,
    /// When the licensee signed.
    #[serde(default)]
    pub signed_at: Option<Timestamp>,
    /// Number of notices ever raised. The arbiter is fixed once non-zero.
    pub disputes_raised: u32,
    /// Current lifecycle state.
    pub state: LicenseState,
    /// Custody of the signing deposit.
    pub escrow: EscrowAccount,
    /// The tranche currently being paid, between approval and completion.
    #[serde(default)]
    pub payout_in_flight: Option<ReleaseKind>,
    /// Secondary grants made by the licensee.
    pub sublicensees: SublicenseeRegistry,
    /// When the license was created.
    pub created_at: Timestamp,
    /// Ordered log of all state transitions.
    pub transitions: Vec<LicenseTransitionRecord>,
}

impl License {
    /// Create a Draft license with the caller as licensor.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidTerms`] if the terms fail validation or
    /// the fee sum overflows.
    pub fn create(id: LicenseId, terms: LicenseTerms, ctx: &CallContext) -> Result<Self, LicenseError> {
        terms.validate(&ctx.caller)?;
        let escrow = EscrowAccount::new(terms.license_fee, terms.breach_fee).map_err(|e| {
            LicenseError::InvalidTerms {
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            id,
            licensor: ctx.caller,
            licensee: None,
            arbiter: terms.arbiter,
            work_hash: terms.work_hash,
            is_commissioned: terms.is_commissioned,
            publication_is_approved: false,
            unauthorized_publication: false,
            time_to_remove_secs: terms.time_to_remove_secs,
            time_of_notification: None,
            license_breached: false,
            breach_declared_at: None,
            start_date: terms.start_date,
            end_date: terms.end_date,
            signed_at: None,
            disputes_raised: 0,
            state: LicenseState::Draft,
            escrow,
            payout_in_flight: None,
            sublicensees: SublicenseeRegistry::new(),
            created_at: ctx.now,
            transitions: Vec::new(),
        })
    }

    // ── Read-only views ──────────────────────────────────────────────

    /// The license fee.
    pub fn license_fee(&self) -> Amount {
        self.escrow.license_fee()
    }

    /// The breach fee.
    pub fn breach_fee(&self) -> Amount {
        self.escrow.breach_fee()
    }

    /// Amount deposited at signing (zero while unsigned).
    pub fn escrowed_amount(&self) -> Amount {
        self.escrow.deposited()
    }

    /// Whether the license fee has been withdrawn.
    pub fn license_fee_withdrawn(&self) -> bool {
        self.escrow.license_fee_released()
    }

    /// Whether the breach fee has been settled in either direction.
    pub fn breach_fee_settled(&self) -> bool {
        self.escrow.breach_fee_settled()
    }

    /// Whether a licensee has signed.
    pub fn is_signed(&self) -> bool {
        self.licensee.is_some()
    }

    /// The dispute-relevant fields, for the breach resolver.
    pub fn timeline(&self) -> DisputeTimeline {
        DisputeTimeline {
            time_to_remove_secs: self.time_to_remove_secs,
            time_of_notification: self.time_of_notification,
            breach_declared_at: self.breach_declared_at,
            signed_at: self.signed_at,
        }
    }

    /// Whether the license is active at `now`: signed, within its term, and
    /// without an unauthorized publication left past its removal deadline
    /// with no breach declared. Pure.
    pub fn is_active(&self, now: Timestamp, resolver: &BreachResolver) -> bool {
        self.is_signed()
            && self.start_date <= now
            && now <= self.end_date
            && !(self.unauthorized_publication && resolver.removal_overdue(&self.timeline(), now))
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Name or replace the arbiter. Licensor only, before any dispute.
    pub fn set_arbiter(&mut self, ctx: &CallContext, arbiter: Address) -> Result<(), LicenseError> {
        let op = Operation::SetArbiter;
        self.require_role(ctx, Role::Licensor, op)?;
        if !matches!(self.state, LicenseState::Draft | LicenseState::Signed) {
            return Err(self.invalid(op, "arbiter can only change before a dispute"));
        }
        if self.disputes_raised > 0 {
            return Err(self.invalid(op, "a dispute has already been raised"));
        }
        if arbiter == self.licensor || Some(arbiter) == self.licensee {
            return Err(LicenseError::InvalidTerms {
                reason: "arbiter must differ from licensor and licensee".to_string(),
            });
        }
        self.arbiter = Some(arbiter);
        Ok(())
    }

    /// Sign as `licensee`, depositing `payment` into escrow. Draft → Signed.
    pub fn sign(
        &mut self,
        ctx: &CallContext,
        licensee: Address,
        payment: Amount,
    ) -> Result<(), LicenseError> {
        let op = Operation::SignLicense;
        if self.state != LicenseState::Draft || self.licensee.is_some() {
            return Err(self.invalid(op, "license is already signed"));
        }
        if licensee == self.licensor {
            return Err(LicenseError::InvalidTerms {
                reason: "licensee must differ from the licensor".to_string(),
            });
        }
        if Some(licensee) == self.arbiter {
            return Err(LicenseError::InvalidTerms {
                reason: "licensee must differ from the arbiter".to_string(),
            });
        }
        self.escrow
            .check_deposit(payment)
            .map_err(|e| self.escrow_error(op, e))?;

        self.escrow
            .deposit(payment, ctx.now)
            .map_err(|e| self.escrow_error(op, e))?;
        self.licensee = Some(licensee);
        self.signed_at = Some(ctx.now);
        self.do_transition(LicenseState::Signed, ctx.now, op);
        Ok(())
    }

    /// Grant secondary rights to `address`. Licensee only. Returns the index.
    pub fn add_sublicensee(&mut self, ctx: &CallContext, address: Address) -> Result<usize, LicenseError> {
        self.require_role(ctx, Role::Licensee, Operation::AddSublicensee)?;
        Ok(self.sublicensees.add(address))
    }

    /// The sublicensee at `index`.
    pub fn sublicensee(&self, index: usize) -> Result<Address, LicenseError> {
        self.sublicensees
            .get(index)
            .ok_or(LicenseError::NoSuchSublicensee {
                license_id: self.id,
                index,
            })
    }

    /// Mark the work as commissioned. Licensor only, Draft or Signed.
    pub fn commission_comments(&mut self, ctx: &CallContext) -> Result<(), LicenseError> {
        let op = Operation::CommissionComments;
        self.require_role(ctx, Role::Licensor, op)?;
        if !matches!(self.state, LicenseState::Draft | LicenseState::Signed) {
            return Err(self.invalid(op, "only draft or signed licenses can be commissioned"));
        }
        self.is_commissioned = true;
        Ok(())
    }

    /// Approve publication. Licensor only, Signed.
    pub fn grant_approval(&mut self, ctx: &CallContext) -> Result<(), LicenseError> {
        let op = Operation::GrantApproval;
        self.require_role(ctx, Role::Licensor, op)?;
        if self.state != LicenseState::Signed {
            return Err(self.invalid(op, "approval requires a signed license without an open dispute"));
        }
        self.publication_is_approved = true;
        Ok(())
    }

    /// Raise an unauthorized-publication notice. Licensor only. Signed → Disputed.
    pub fn set_unauthorized_publication(&mut self, ctx: &CallContext) -> Result<(), LicenseError> {
        let op = Operation::SetUnauthorizedPublication;
        self.require_role(ctx, Role::Licensor, op)?;
        self.require_no_payout_in_flight(op)?;
        if self.state != LicenseState::Signed {
            return Err(self.invalid(op, "a notice requires a signed license without an open dispute"));
        }
        if self.escrow.breach_fee_settled() {
            return Err(self.invalid(op, "breach fee is no longer held"));
        }
        self.unauthorized_publication = true;
        self.time_of_notification = Some(ctx.now);
        self.disputes_raised = self.disputes_raised.saturating_add(1);
        self.do_transition(LicenseState::Disputed, ctx.now, op);
        Ok(())
    }

    /// Clear the notice after the content was taken down. Arbiter only.
    /// Disputed → Signed.
    pub fn declare_removed(&mut self, ctx: &CallContext) -> Result<(), LicenseError> {
        let op = Operation::DeclareRemoved;
        self.require_role(ctx, Role::Arbiter, op)?;
        self.require_no_payout_in_flight(op)?;
        if self.state != LicenseState::Disputed {
            return Err(self.invalid(op, "no unauthorized publication is outstanding"));
        }
        if self.license_breached {
            return Err(self.invalid(op, "breach has already been declared"));
        }
        self.unauthorized_publication = false;
        self.time_of_notification = None;
        self.do_transition(LicenseState::Signed, ctx.now, op);
        Ok(())
    }

    /// Declare the licensee in breach. Arbiter only, at or after the removal
    /// deadline.
    pub fn declare_breach(
        &mut self,
        ctx: &CallContext,
        resolver: &BreachResolver,
    ) -> Result<(), LicenseError> {
        let op = Operation::DeclareBreach;
        self.require_role(ctx, Role::Arbiter, op)?;
        self.require_no_payout_in_flight(op)?;
        if self.state != LicenseState::Disputed {
            return Err(self.invalid(op, "no unauthorized publication is outstanding"));
        }
        if self.license_breached {
            return Err(self.invalid(op, "breach has already been declared"));
        }
        if self.escrow.breach_fee_settled() {
            return Err(self.invalid(op, "breach fee is no longer held"));
        }
        let deadline = resolver.removal_deadline(&self.timeline());
        self.require_time(ctx, deadline, op)?;

        self.license_breached = true;
        self.breach_declared_at = Some(ctx.now);
        Ok(())
    }

    /// Approve paying the license fee to the licensor. Licensor only, once,
    /// after signing.
    pub fn withdraw_license_fee(&mut self, ctx: &CallContext) -> Result<Payout, LicenseError> {
        let op = Operation::WithdrawLicenseFee;
        self.require_role(ctx, Role::Licensor, op)?;
        self.require_no_payout_in_flight(op)?;
        self.escrow
            .ensure_license_fee_held()
            .map_err(|e| self.escrow_error(op, e))?;
        if !self.is_signed() {
            return Err(self.invalid(op, "license is not signed"));
        }
        Ok(self.begin_payout(ReleaseKind::LicenseFee, self.licensor, Role::Licensor))
    }

    /// Approve forfeiting the breach fee to the licensor. Licensor only, after
    /// a declared breach and the breach claim window.
    pub fn withdraw_breach_fee(
        &mut self,
        ctx: &CallContext,
        resolver: &BreachResolver,
    ) -> Result<Payout, LicenseError> {
        let op = Operation::WithdrawBreachFee;
        self.require_role(ctx, Role::Licensor, op)?;
        self.require_no_payout_in_flight(op)?;
        self.escrow
            .ensure_breach_fee_held()
            .map_err(|e| self.escrow_error(op, e))?;
        if !self.license_breached {
            return Err(self.invalid(op, "no breach has been declared"));
        }
        let opens_at = resolver.breach_claim_opens_at(&self.timeline());
        self.require_time(ctx, opens_at, op)?;

        let kind = ReleaseKind::BreachFee(BreachFeeDisposition::ToLicensor);
        Ok(self.begin_payout(kind, self.licensor, Role::Licensor))
    }

    /// Approve returning the breach fee to the licensee. Licensee only, when
    /// no breach was declared and the return grace window has elapsed.
    pub fn return_breach_fee(
        &mut self,
        ctx: &CallContext,
        resolver: &BreachResolver,
    ) -> Result<Payout, LicenseError> {
        let op = Operation::ReturnBreachFee;
        let licensee = self.require_role(ctx, Role::Licensee, op)?;
        self.require_no_payout_in_flight(op)?;
        self.escrow
            .ensure_breach_fee_held()
            .map_err(|e| self.escrow_error(op, e))?;
        if self.license_breached {
            return Err(self.invalid(op, "breach has been declared"));
        }
        let opens_at = resolver.return_opens_at(&self.timeline());
        self.require_time(ctx, opens_at, op)?;

        let kind = ReleaseKind::BreachFee(BreachFeeDisposition::ToLicensee);
        Ok(self.begin_payout(kind, licensee, Role::Licensee))
    }

    /// Record a paid payout: release the tranche from escrow and settle the
    /// license once both tranches are gone.
    ///
    /// # Errors
    ///
    /// Fails with `WrongState` if `payout` is not the one in flight.
    pub fn complete_payout(
        &mut self,
        payout: &Payout,
        at: Timestamp,
        op: Operation,
    ) -> Result<Release, LicenseError> {
        if self.payout_in_flight != Some(payout.kind) {
            return Err(self.invalid(op, "payout is not in flight"));
        }
        self.payout_in_flight = None;
        let release = match payout.kind {
            ReleaseKind::LicenseFee => self.escrow.release_license_fee(at),
            ReleaseKind::BreachFee(disposition) => self.escrow.release_breach_fee(disposition, at),
        }
        .map_err(|e| self.escrow_error(op, e))?;
        self.settle_if_complete(at, op);
        Ok(release)
    }

    /// Drop a payout the payee could not receive. The tranche stays held.
    pub fn abandon_payout(&mut self, payout: &Payout) {
        if self.payout_in_flight == Some(payout.kind) {
            self.payout_in_flight = None;
        }
    }

    // ── Guards ───────────────────────────────────────────────────────

    /// Check that the caller holds `role`; returns the role holder.
    fn require_role(&self, ctx: &CallContext, role: Role, op: Operation) -> Result<Address, LicenseError> {
        let holder = match role {
            Role::Licensor => Some(self.licensor),
            Role::Licensee => self.licensee,
            Role::Arbiter => self.arbiter,
            Role::Escrow => None,
        };
        match holder {
            Some(addr) if addr == ctx.caller => Ok(addr),
            _ => Err(LicenseError::Unauthorized {
                license_id: self.id,
                operation: op,
                required: role,
                caller: ctx.caller,
            }),
        }
    }

    fn require_no_payout_in_flight(&self, op: Operation) -> Result<(), LicenseError> {
        match self.payout_in_flight {
            None => Ok(()),
            Some(_) => Err(self.invalid(op, "a payout is in flight")),
        }
    }

    fn begin_payout(&mut self, kind: ReleaseKind, payee: Address, payee_role: Role) -> Payout {
        self.payout_in_flight = Some(kind);
        Payout {
            kind,
            amount: self.escrow.tranche_amount(kind),
            payee,
            payee_role,
        }
    }

    fn require_time(
        &self,
        ctx: &CallContext,
        opens_at: Option<Timestamp>,
        op: Operation,
    ) -> Result<(), LicenseError> {
        if ctx.now.has_reached(opens_at) {
            return Ok(());
        }
        Err(LicenseError::TooEarly {
            license_id: self.id,
            operation: op,
            opens_at,
            now: ctx.now,
        })
    }

    fn invalid(&self, op: Operation, reason: &str) -> LicenseError {
        LicenseError::InvalidTransition {
            license_id: self.id,
            operation: op,
            state: self.state,
            reason: reason.to_string(),
        }
    }

    fn escrow_error(&self, op: Operation, source: ArbitrationError) -> LicenseError {
        LicenseError::Escrow {
            license_id: self.id,
            operation: op,
            source,
        }
    }

    fn settle_if_complete(&mut self, at: Timestamp, op: Operation) {
        if self.escrow.is_settled() && self.state != LicenseState::Settled {
            self.do_transition(LicenseState::Settled, at, op);
        }
    }

    /// Record a state transition.
    fn do_transition(&mut self, to: LicenseState, at: Timestamp, op: Operation) {
        self.transitions.push(LicenseTransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: at,
            operation: op,
        });
        self.state = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
