//! Key state and the reducer that derives it.
//!
//! Key state is never stored authoritatively: it is recomputed by folding a
//! log's events, in order, over [`KeyState::default`]. Each step either
//! yields a new state or rejects the event; the prior state is never mutated.
//!
//! The reducer enforces log integrity itself. Sequence numbers must advance
//! by exactly one, every non-inception event must chain to the prior digest
//! and name the same identifier, and a log may be incepted only once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date::format_datetime;
use crate::error::StateError;
use crate::event::{InceptionEvent, InteractionEvent, KeyEvent, RotationEvent};
use crate::message::Message;
use crate::types::{HexNum, Threshold};
use crate::version::KERI;

/// Witness configuration as of the latest establishment event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstablishmentRecord {
    pub s: String,
    pub d: String,
    pub br: Vec<String>,
    pub ba: Vec<String>,
}

/// Current key state of one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    /// Version of the key state record.
    pub vn: [u8; 2],
    pub i: String,
    /// Sequence number of the latest event, hex.
    pub s: String,
    /// Digest of the event before the latest.
    pub p: String,
    /// Digest of the latest event.
    pub d: String,
    /// First-seen ordinal of the latest event, hex.
    pub f: String,
    /// When this state was derived.
    pub dt: String,
    /// Ilk of the latest event.
    pub et: String,
    pub kt: Threshold,
    pub k: Vec<String>,
    pub nt: Threshold,
    pub n: Vec<String>,
    pub bt: String,
    pub b: Vec<String>,
    pub c: Vec<String>,
    pub ee: EstablishmentRecord,
    /// Delegator, for delegated identifiers.
    pub di: String,
}

impl Default for KeyState {
    fn default() -> Self {
        Self {
            vn: [1, 0],
            i: String::new(),
            s: String::new(),
            p: String::new(),
            d: String::new(),
            f: HexNum::ZERO.to_hex(),
            dt: String::new(),
            et: String::new(),
            kt: Threshold::default(),
            k: Vec::new(),
            nt: Threshold::default(),
            n: Vec::new(),
            bt: String::new(),
            b: Vec::new(),
            c: Vec::new(),
            ee: EstablishmentRecord::default(),
            di: String::new(),
        }
    }
}

impl KeyState {
    /// Whether an inception has been applied.
    pub fn is_incepted(&self) -> bool {
        !self.i.is_empty()
    }

    /// Sequence number of the latest event.
    pub fn sn(&self) -> Option<HexNum> {
        HexNum::from_hex(&self.s)
    }
}

/// Apply one message to `prior`, stamping the result with the current time.
pub fn reduce(prior: &KeyState, message: &Message) -> Result<KeyState, StateError> {
    reduce_at(prior, message, Utc::now())
}

/// Apply one message to `prior`, stamping the result with `now`.
///
/// Messages of a protocol other than KERI leave the state unchanged.
pub fn reduce_at(
    prior: &KeyState,
    message: &Message,
    now: DateTime<Utc>,
) -> Result<KeyState, StateError> {
    if message.version.protocol != KERI {
        return Ok(prior.clone());
    }

    let mut next = match &message.payload {
        KeyEvent::Inception(e) | KeyEvent::DelegatedInception(e) => incept(prior, e)?,
        KeyEvent::Rotation(e) | KeyEvent::DelegatedRotation(e) => rotate(prior, e)?,
        KeyEvent::Interaction(e) => interact(prior, e)?,
        other => {
            return Err(StateError::UnsupportedEventType(
                other.ilk_str().to_string(),
            ))
        }
    };

    next.et = message.payload.ilk_str().to_string();
    next.dt = format_datetime(&now);
    next.f = if prior.is_incepted() {
        HexNum::from_hex(&prior.f)
            .unwrap_or(HexNum::ZERO)
            .next()
            .to_hex()
    } else {
        HexNum::ZERO.to_hex()
    };

    debug!(i = %next.i, s = %next.s, et = %next.et, "reduced key event");
    Ok(next)
}

/// Fold messages from the initial state.
pub fn resolve_key_state<'a, I>(messages: I) -> Result<KeyState, StateError>
where
    I: IntoIterator<Item = &'a Message>,
{
    messages
        .into_iter()
        .try_fold(KeyState::default(), |state, message| reduce(&state, message))
}

fn incept(prior: &KeyState, e: &InceptionEvent) -> Result<KeyState, StateError> {
    if prior.is_incepted() {
        return Err(StateError::DuplicateInception(prior.i.clone()));
    }
    if e.s != HexNum::ZERO {
        return Err(StateError::OutOfOrder {
            expected: 0,
            got: e.s.value(),
        });
    }

    Ok(KeyState {
        vn: prior.vn,
        i: e.i.clone(),
        s: e.s.to_hex(),
        p: String::new(),
        d: e.d.clone(),
        f: prior.f.clone(),
        dt: prior.dt.clone(),
        et: String::new(),
        kt: e.kt.clone(),
        k: e.k.clone(),
        nt: e.nt.clone(),
        n: e.n.clone(),
        bt: e.bt.to_hex(),
        b: e.b.clone(),
        c: e.c.clone(),
        ee: EstablishmentRecord {
            s: e.s.to_hex(),
            d: e.d.clone(),
            br: Vec::new(),
            ba: e.b.clone(),
        },
        di: e.di.clone().unwrap_or_default(),
    })
}

/// Check that an event at `s` with prior digest `p` extends `prior`.
fn check_sequence(prior: &KeyState, i: &str, s: HexNum, p: &str) -> Result<(), StateError> {
    if prior.d.is_empty() {
        return Err(StateError::MissingPriorEstablishment);
    }
    if i != prior.i {
        return Err(StateError::IdentifierMismatch {
            expected: prior.i.clone(),
            got: i.to_string(),
        });
    }
    let expected = prior.sn().unwrap_or(HexNum::ZERO).next();
    if s != expected {
        return Err(StateError::OutOfOrder {
            expected: expected.value(),
            got: s.value(),
        });
    }
    if p != prior.d {
        return Err(StateError::PriorDigestMismatch {
            expected: prior.d.clone(),
            got: p.to_string(),
        });
    }
    Ok(())
}

fn interact(prior: &KeyState, e: &InteractionEvent) -> Result<KeyState, StateError> {
    check_sequence(prior, &e.i, e.s, &e.p)?;
    Ok(KeyState {
        s: e.s.to_hex(),
        p: prior.d.clone(),
        d: e.d.clone(),
        ..prior.clone()
    })
}

fn rotate(prior: &KeyState, e: &RotationEvent) -> Result<KeyState, StateError> {
    check_sequence(prior, &e.i, e.s, &e.p)?;

    let mut b: Vec<String> = prior
        .b
        .iter()
        .filter(|w| !e.br.contains(w))
        .cloned()
        .collect();
    for w in &e.ba {
        if !b.contains(w) {
            b.push(w.clone());
        }
    }

    Ok(KeyState {
        s: e.s.to_hex(),
        p: prior.d.clone(),
        d: e.d.clone(),
        kt: e.kt.clone(),
        k: e.k.clone(),
        nt: e.nt.clone(),
        n: e.n.clone(),
        bt: e.bt.to_hex(),
        b,
        ee: EstablishmentRecord {
            s: e.s.to_hex(),
            d: e.d.clone(),
            br: e.br.clone(),
            ba: e.ba.clone(),
        },
        ..prior.clone()
    })
}
