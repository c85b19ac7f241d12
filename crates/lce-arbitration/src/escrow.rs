//! # Escrow Operations
//!
//! Holds the deposit paid at signing and releases it in two tranches: the
//! license fee (always owed to the licensor) and the breach fee (owed to the
//! licensor after a declared breach, or returned to the licensee otherwise).
//!
//! ## Security Invariant
//!
//! Each tranche is released at most once. The breach fee has exactly one
//! disposition: once paid to one side it can never be paid to the other.
//! A release is recorded only after the payee has been paid, so the account
//! never shows a tranche as released that was not.
//!
//! Status machine: `Pending → Funded → PartiallyReleased → FullyReleased`

use lce_core::{Amount, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ArbitrationError;

// ── Identifiers ────────────────────────────────────────────────────────

/// A unique identifier for an escrow transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Create a new random transaction identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "escrow-tx:{}", self.0)
    }
}

// ── Escrow Status ──────────────────────────────────────────────────────

/// The status of an escrow account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// Created with the license, not yet funded.
    Pending,
    /// Deposit received at signing, nothing released.
    Funded,
    /// One tranche released.
    PartiallyReleased,
    /// Both tranches released. Terminal.
    FullyReleased,
}

impl EscrowStatus {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Funded => "FUNDED",
            Self::PartiallyReleased => "PARTIALLY_RELEASED",
            Self::FullyReleased => "FULLY_RELEASED",
        }
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Releases ───────────────────────────────────────────────────────────

/// Where the breach fee went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreachFeeDisposition {
    /// Forfeited to the licensor after a declared breach.
    ToLicensor,
    /// Returned to the licensee after the grace window.
    ToLicensee,
}

/// Which tranche a release paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseKind {
    /// The license fee, always to the licensor.
    LicenseFee,
    /// The breach fee, to whichever side the disposition names.
    BreachFee(BreachFeeDisposition),
}

impl ReleaseKind {
    fn tranche(&self) -> &'static str {
        match self {
            Self::LicenseFee => "license_fee",
            Self::BreachFee(_) => "breach_fee",
        }
    }
}

/// Receipt for a recorded release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// The escrow transaction that recorded the release.
    pub transaction_id: TransactionId,
    /// The tranche released.
    pub kind: ReleaseKind,
    /// The amount released.
    pub amount: Amount,
}

// ── Escrow Transaction ─────────────────────────────────────────────────

/// Types of escrow transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Signing deposit.
    Deposit,
    /// License fee paid to the licensor.
    LicenseFeeRelease,
    /// Breach fee forfeited to the licensor.
    BreachFeeToLicensor,
    /// Breach fee returned to the licensee.
    BreachFeeToLicensee,
}

/// A recorded escrow transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowTransaction {
    /// Transaction identifier.
    pub id: TransactionId,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Amount moved.
    pub amount: Amount,
    /// When the transaction occurred.
    pub timestamp: Timestamp,
}

// ── Escrow Account ─────────────────────────────────────────────────────

/// Custody of one license's signing deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    license_fee: Amount,
    breach_fee: Amount,
    deposited: Amount,
    held: Amount,
    license_fee_released: bool,
    breach_fee_disposition: Option<BreachFeeDisposition>,
    status: EscrowStatus,
    transactions: Vec<EscrowTransaction>,
}

impl EscrowAccount {
    /// Create an unfunded escrow for the given fee tranches.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrationError::FeeOverflow`] if the fee sum does not fit
    /// in an [`Amount`].
    pub fn new(license_fee: Amount, breach_fee: Amount) -> Result<Self, ArbitrationError> {
        license_fee
            .checked_add(breach_fee)
            .ok_or(ArbitrationError::FeeOverflow {
                license_fee,
                breach_fee,
            })?;
        Ok(Self {
            license_fee,
            breach_fee,
            deposited: Amount::ZERO,
            held: Amount::ZERO,
            license_fee_released: false,
            breach_fee_disposition: None,
            status: EscrowStatus::Pending,
            transactions: Vec::new(),
        })
    }

    /// License fee plus breach fee.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrationError::FeeOverflow`] if the sum does not fit. An
    /// account built with [`EscrowAccount::new`] never overflows, but one
    /// deserialized from untrusted input might.
    pub fn required_deposit(&self) -> Result<Amount, ArbitrationError> {
        self.license_fee
            .checked_add(self.breach_fee)
            .ok_or(ArbitrationError::FeeOverflow {
                license_fee: self.license_fee,
                breach_fee: self.breach_fee,
            })
    }

    /// The amount of one tranche.
    pub fn tranche_amount(&self, kind: ReleaseKind) -> Amount {
        match kind {
            ReleaseKind::LicenseFee => self.license_fee,
            ReleaseKind::BreachFee(_) => self.breach_fee,
        }
    }

    /// The license-fee tranche.
    pub fn license_fee(&self) -> Amount {
        self.license_fee
    }

    /// The breach-fee tranche.
    pub fn breach_fee(&self) -> Amount {
        self.breach_fee
    }

    /// Total deposited at signing.
    pub fn deposited(&self) -> Amount {
        self.deposited
    }

    /// Amount still held.
    pub fn held(&self) -> Amount {
        self.held
    }

    /// Whether the license fee has been paid out.
    pub fn license_fee_released(&self) -> bool {
        self.license_fee_released
    }

    /// Where the breach fee went, if it has been settled.
    pub fn breach_fee_disposition(&self) -> Option<BreachFeeDisposition> {
        self.breach_fee_disposition
    }

    /// Whether the breach fee has been settled in either direction.
    pub fn breach_fee_settled(&self) -> bool {
        self.breach_fee_disposition.is_some()
    }

    /// Current status.
    pub fn status(&self) -> EscrowStatus {
        self.status
    }

    /// Transaction history, oldest first.
    pub fn transactions(&self) -> &[EscrowTransaction] {
        &self.transactions
    }

    /// Whether both tranches have been released.
    pub fn is_settled(&self) -> bool {
        self.status == EscrowStatus::FullyReleased
    }

    /// Validate a deposit without applying it.
    pub fn check_deposit(&self, amount: Amount) -> Result<(), ArbitrationError> {
        if self.status != EscrowStatus::Pending {
            return Err(self.invalid("deposit"));
        }
        let expected = self.required_deposit()?;
        if amount != expected {
            return Err(ArbitrationError::DepositMismatch {
                expected,
                actual: amount,
            });
        }
        Ok(())
    }

    /// Accept the signing deposit. Transitions Pending → Funded.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrationError::InvalidEscrowOperation`] if already funded
    /// and [`ArbitrationError::DepositMismatch`] if `amount` is not exactly
    /// the fee sum.
    pub fn deposit(&mut self, amount: Amount, at: Timestamp) -> Result<(), ArbitrationError> {
        self.check_deposit(amount)?;
        self.deposited = amount;
        self.held = amount;
        self.status = EscrowStatus::Funded;
        self.push(TransactionType::Deposit, amount, at);
        Ok(())
    }

    /// Fail with [`ArbitrationError::AlreadyReleased`] if the license fee is gone.
    pub fn ensure_license_fee_held(&self) -> Result<(), ArbitrationError> {
        if self.license_fee_released {
            return Err(ArbitrationError::AlreadyReleased {
                tranche: ReleaseKind::LicenseFee.tranche().to_string(),
            });
        }
        Ok(())
    }

    /// Fail with [`ArbitrationError::AlreadyReleased`] if the breach fee has
    /// been settled in either direction.
    pub fn ensure_breach_fee_held(&self) -> Result<(), ArbitrationError> {
        if self.breach_fee_disposition.is_some() {
            return Err(ArbitrationError::AlreadyReleased {
                tranche: "breach_fee".to_string(),
            });
        }
        Ok(())
    }

    /// Release the license fee.
    pub fn release_license_fee(&mut self, at: Timestamp) -> Result<Release, ArbitrationError> {
        self.ensure_license_fee_held()?;
        self.release(ReleaseKind::LicenseFee, at)
    }

    /// Release the breach fee to one side.
    pub fn release_breach_fee(
        &mut self,
        disposition: BreachFeeDisposition,
        at: Timestamp,
    ) -> Result<Release, ArbitrationError> {
        self.ensure_breach_fee_held()?;
        self.release(ReleaseKind::BreachFee(disposition), at)
    }

    fn release(&mut self, kind: ReleaseKind, at: Timestamp) -> Result<Release, ArbitrationError> {
        if !matches!(
            self.status,
            EscrowStatus::Funded | EscrowStatus::PartiallyReleased
        ) {
            return Err(self.invalid(&format!("release_{}", kind.tranche())));
        }
        let (amount, transaction_type) = match kind {
            ReleaseKind::LicenseFee => (self.license_fee, TransactionType::LicenseFeeRelease),
            ReleaseKind::BreachFee(BreachFeeDisposition::ToLicensor) => {
                (self.breach_fee, TransactionType::BreachFeeToLicensor)
            }
            ReleaseKind::BreachFee(BreachFeeDisposition::ToLicensee) => {
                (self.breach_fee, TransactionType::BreachFeeToLicensee)
            }
        };
        let held = self
            .held
            .checked_sub(amount)
            .ok_or_else(|| self.invalid(&format!("release_{}", kind.tranche())))?;

        match kind {
            ReleaseKind::LicenseFee => self.license_fee_released = true,
            ReleaseKind::BreachFee(d) => self.breach_fee_disposition = Some(d),
        }
        self.held = held;
        self.status = self.release_status();
        let transaction_id = self.push(transaction_type, amount, at);
        Ok(Release {
            transaction_id,
            kind,
            amount,
        })
    }

    fn release_status(&self) -> EscrowStatus {
        match (self.license_fee_released, self.breach_fee_disposition.is_some()) {
            (false, false) => EscrowStatus::Funded,
            (true, true) => EscrowStatus::FullyReleased,
            _ => EscrowStatus::PartiallyReleased,
        }
    }

    fn push(
        &mut self,
        transaction_type: TransactionType,
        amount: Amount,
        at: Timestamp,
    ) -> TransactionId {
        let id = TransactionId::new();
        self.transactions.push(EscrowTransaction {
            id,
            transaction_type,
            amount,
            timestamp: at,
        });
        id
    }

    fn invalid(&self, operation: &str) -> ArbitrationError {
        ArbitrationError::InvalidEscrowOperation {
            operation: operation.to_string(),
            status: self.status.as_str().to_string(),
        }
    }
}
