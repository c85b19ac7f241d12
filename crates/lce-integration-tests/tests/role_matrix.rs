//! # Role and Guard Matrix
//!
//! Every operation is attempted by every party. Only the designated role may
//! succeed; everyone else is rejected with `Unauthorized` and the record is
//! left untouched.

use std::sync::Arc;

use lce_core::{Address, Amount, CallContext, ErrorKind, LicenseId, Timestamp, WorkHash};
use lce_engine::{EngineResult, EventLog, InMemoryTreasury, LicenseEngine};
use lce_state::{LicenseState, LicenseTerms};

// =========================================================================
// Helpers
// =========================================================================

fn licensor() -> Address {
    Address::from_bytes([0x11; 20])
}
fn licensee() -> Address {
    Address::from_bytes([0x22; 20])
}
fn arbiter() -> Address {
    Address::from_bytes([0x33; 20])
}
fn outsider() -> Address {
    Address::from_bytes([0x44; 20])
}

fn parties() -> [Address; 4] {
    [licensor(), licensee(), arbiter(), outsider()]
}

fn at(secs: i64) -> Timestamp {
    Timestamp::from_epoch_secs(secs).unwrap()
}

fn ctx(caller: Address, secs: i64) -> CallContext {
    CallContext::new(caller, at(secs))
}

fn engine() -> LicenseEngine {
    LicenseEngine::with_defaults(Arc::new(InMemoryTreasury::new()), Arc::new(EventLog::new()))
}

fn terms() -> LicenseTerms {
    LicenseTerms::new(
        WorkHash::of_content(b"photo series"),
        Amount::new(10),
        Amount::new(20),
        100,
        at(1_000),
        at(1_000_000),
    )
    .with_arbiter(arbiter())
}

fn signed(engine: &LicenseEngine) -> LicenseId {
    let id = engine.new_license(&ctx(licensor(), 1_000), terms()).unwrap();
    engine
        .sign_license(&ctx(licensee(), 1_000), id, licensee(), Amount::new(30))
        .unwrap();
    id
}

fn disputed(engine: &LicenseEngine) -> LicenseId {
    let id = signed(engine);
    engine
        .set_unauthorized_publication(&ctx(licensor(), 2_000), id)
        .unwrap();
    id
}

/// Call `op` as each non-`allowed` party and check it is rejected without
/// changing the record; then call it as `allowed` and return the result.
fn only<T: std::fmt::Debug>(
    engine: &LicenseEngine,
    id: LicenseId,
    allowed: Address,
    op: impl Fn(&CallContext) -> EngineResult<T>,
    secs: i64,
) -> EngineResult<T> {
    for caller in parties() {
        if caller == allowed {
            continue;
        }
        let before = engine.license(id).unwrap();
        let err = op(&ctx(caller, secs)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized, "caller {caller}: {err}");
        assert_eq!(engine.license(id).unwrap(), before);
    }
    op(&ctx(allowed, secs))
}

// =========================================================================
// Licensor-only operations
// =========================================================================

#[test]
fn set_arbiter_is_licensor_only() {
    let e = engine();
    let id = e.new_license(&ctx(licensor(), 0), terms()).unwrap();
    let new_arbiter = Address::from_bytes([0x55; 20]);
    only(&e, id, licensor(), |c| e.set_arbiter(c, id, new_arbiter), 0).unwrap();
    assert_eq!(e.license(id).unwrap().arbiter, Some(new_arbiter));
}

#[test]
fn commission_comments_is_licensor_only() {
    let e = engine();
    let id = signed(&e);
    only(&e, id, licensor(), |c| e.commission_comments(c, id), 1_500).unwrap();
    assert!(e.license(id).unwrap().is_commissioned);
}

#[test]
fn grant_approval_is_licensor_only() {
    let e = engine();
    let id = signed(&e);
    only(&e, id, licensor(), |c| e.grant_approval(c, id), 1_500).unwrap();
    assert!(e.license(id).unwrap().publication_is_approved);
}

#[test]
fn set_unauthorized_publication_is_licensor_only() {
    let e = engine();
    let id = signed(&e);
    only(&e, id, licensor(), |c| e.set_unauthorized_publication(c, id), 1_500).unwrap();
    assert_eq!(e.license(id).unwrap().state, LicenseState::Disputed);
}

#[test]
fn withdraw_license_fee_is_licensor_only() {
    let e = engine();
    let id = signed(&e);
    let t = only(&e, id, licensor(), |c| e.withdraw_license_fee(c, id), 1_500).unwrap();
    assert_eq!(t.amount, Amount::new(10));
}

#[test]
fn withdraw_breach_fee_is_licensor_only() {
    let e = engine();
    let id = disputed(&e);
    e.declare_breach(&ctx(arbiter(), 2_100), id).unwrap();
    let opens = 2_100 + e.windows().breach_claim_window_secs as i64;
    let t = only(&e, id, licensor(), |c| e.withdraw_breach_fee(c, id), opens).unwrap();
    assert_eq!(t.amount, Amount::new(20));
}

// =========================================================================
// Arbiter-only operations
// =========================================================================

#[test]
fn declare_removed_is_arbiter_only() {
    let e = engine();
    let id = disputed(&e);
    only(&e, id, arbiter(), |c| e.declare_removed(c, id), 2_050).unwrap();
    assert_eq!(e.license(id).unwrap().state, LicenseState::Signed);
}

#[test]
fn declare_breach_is_arbiter_only() {
    let e = engine();
    let id = disputed(&e);
    only(&e, id, arbiter(), |c| e.declare_breach(c, id), 2_100).unwrap();
    assert!(e.license(id).unwrap().license_breached);
}

// =========================================================================
// Licensee-only operations
// =========================================================================

#[test]
fn add_sublicensee_is_licensee_only() {
    let e = engine();
    let id = signed(&e);
    let sub = Address::from_bytes([0x66; 20]);
    let index = only(&e, id, licensee(), |c| e.add_sublicensee(c, id, sub), 1_500).unwrap();
    assert_eq!(index, 0);
}

#[test]
fn add_sublicensee_before_signing_rejects_everyone() {
    let e = engine();
    let id = e.new_license(&ctx(licensor(), 0), terms()).unwrap();
    for caller in parties() {
        let err = e
            .add_sublicensee(&ctx(caller, 0), id, outsider())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}

#[test]
fn return_breach_fee_is_licensee_only() {
    let e = engine();
    let id = signed(&e);
    let opens = 1_100 + e.windows().return_grace_window_secs as i64;
    let t = only(&e, id, licensee(), |c| e.return_breach_fee(c, id), opens).unwrap();
    assert_eq!(t.amount, Amount::new(20));
}

// =========================================================================
// Guard order
// =========================================================================

#[test]
fn role_is_checked_before_state() {
    let e = engine();
    let id = e.new_license(&ctx(licensor(), 0), terms()).unwrap();
    // Wrong caller on an unsigned license: role wins over state.
    let err = e.grant_approval(&ctx(outsider(), 0), id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    let err = e.grant_approval(&ctx(licensor(), 0), id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongState);
}

#[test]
fn replay_is_checked_before_time() {
    let e = engine();
    let id = signed(&e);
    let opens = 1_100 + e.windows().return_grace_window_secs as i64;
    e.return_breach_fee(&ctx(licensee(), opens), id).unwrap();
    // Too early for a forfeit and no breach, but the fee is already gone.
    let err = e.withdraw_breach_fee(&ctx(licensor(), 0), id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadySettled);
}

#[test]
fn state_is_checked_before_time() {
    let e = engine();
    let id = signed(&e);
    // Signed, not disputed: the missing notice is reported, not the clock.
    let err = e.declare_breach(&ctx(arbiter(), 0), id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongState);
}

#[test]
fn wrong_deposit_changes_nothing() {
    let e = engine();
    let id = e.new_license(&ctx(licensor(), 0), terms()).unwrap();
    let err = e
        .sign_license(&ctx(licensee(), 0), id, licensee(), Amount::new(29))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongDepositAmount);
    let lic = e.license(id).unwrap();
    assert_eq!(lic.licensee, None);
    assert_eq!(lic.state, LicenseState::Draft);

    e.sign_license(&ctx(licensee(), 0), id, licensee(), Amount::new(30))
        .unwrap();
    let err = e
        .sign_license(&ctx(outsider(), 0), id, outsider(), Amount::new(30))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongState);
}

#[test]
fn activation_status_is_open_to_everyone() {
    let e = engine();
    let id = signed(&e);
    for caller in parties() {
        assert!(e.license_activation_status(&ctx(caller, 5_000), id).unwrap());
    }
}
