//! Event builders.
//!
//! Builders assemble an event body in wire order, compute its version string
//! and SAID, and return the typed event.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::codes::matter;
use crate::date::format_datetime;
use crate::error::EventError;
use crate::event::{
    Ilk, InceptionEvent, InteractionEvent, QueryEvent, ReceiptEvent, ReplyEvent, RotationEvent,
};
use crate::said::{saidify, versify, SAID_LABEL};
use crate::state::KeyState;
use crate::types::{HexNum, Threshold};
use crate::version::Kind;

fn finish<T: DeserializeOwned>(
    body: Value,
    kind: Kind,
    labels: &[&str],
) -> Result<T, EventError> {
    let Value::Object(mut map) = body else {
        return Err(EventError::NotAnObject);
    };
    if labels.is_empty() {
        versify(&mut map, kind)?;
    } else {
        saidify(&mut map, kind, labels)?;
    }
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Default backer threshold: none for no witnesses, one for a single
/// witness, otherwise all but one.
pub fn default_backer_threshold(witnesses: usize) -> u64 {
    match witnesses {
        0 => 0,
        1 => 1,
        n => n as u64 - 1,
    }
}

/// Builder for inception (`icp`) and delegated inception (`dip`) events.
#[derive(Debug, Clone)]
pub struct InceptionBuilder {
    keys: Vec<String>,
    kt: Option<Threshold>,
    next: Vec<String>,
    nt: Option<Threshold>,
    witnesses: Vec<String>,
    toad: Option<u64>,
    config: Vec<String>,
    data: Vec<Value>,
    delegator: Option<String>,
    kind: Kind,
}

impl InceptionBuilder {
    /// Start building an inception over the given signing keys.
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            kt: None,
            next: Vec::new(),
            nt: None,
            witnesses: Vec::new(),
            toad: None,
            config: Vec::new(),
            data: Vec::new(),
            delegator: None,
            kind: Kind::Json,
        }
    }

    /// Set the signing threshold. Defaults to all keys.
    pub fn key_threshold(mut self, kt: Threshold) -> Self {
        self.kt = Some(kt);
        self
    }

    /// Set the next-key digests.
    pub fn next_digests(mut self, n: Vec<String>) -> Self {
        self.next = n;
        self
    }

    /// Set the next signing threshold. Defaults to all next keys.
    pub fn next_threshold(mut self, nt: Threshold) -> Self {
        self.nt = Some(nt);
        self
    }

    /// Set the witness list.
    pub fn witnesses(mut self, b: Vec<String>) -> Self {
        self.witnesses = b;
        self
    }

    /// Set the witness threshold.
    pub fn witness_threshold(mut self, toad: u64) -> Self {
        self.toad = Some(toad);
        self
    }

    /// Set configuration traits.
    pub fn config(mut self, c: Vec<String>) -> Self {
        self.config = c;
        self
    }

    /// Set anchored data (seals).
    pub fn data(mut self, a: Vec<Value>) -> Self {
        self.data = a;
        self
    }

    /// Make this a delegated inception under `delegator`.
    pub fn delegator(mut self, di: impl Into<String>) -> Self {
        self.delegator = Some(di.into());
        self
    }

    /// Set the serialization kind.
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the identifier will be self-addressing rather than the bare
    /// key.
    fn transferable(&self) -> bool {
        self.keys.len() > 1
            || self.delegator.is_some()
            || self
                .keys
                .first()
                .map(|k| !k.starts_with(matter::ED25519N))
                .unwrap_or(false)
    }

    /// Build the event, computing its SAID.
    pub fn build(self) -> Result<InceptionEvent, EventError> {
        if self.keys.is_empty() {
            return Err(EventError::NoKeys);
        }
        let transferable = self.transferable();
        let ilk = if self.delegator.is_some() {
            Ilk::Dip
        } else {
            Ilk::Icp
        };
        let kt = self
            .kt
            .unwrap_or_else(|| Threshold::simple(self.keys.len() as u64));
        let nt = self
            .nt
            .unwrap_or_else(|| Threshold::simple(self.next.len() as u64));
        let bt = self
            .toad
            .unwrap_or_else(|| default_backer_threshold(self.witnesses.len()));
        let prefix = if transferable {
            String::new()
        } else {
            self.keys[0].clone()
        };

        let mut body = json!({
            "v": "",
            "t": ilk,
            "d": "",
            "i": prefix,
            "s": HexNum::ZERO,
            "kt": kt,
            "k": self.keys,
            "nt": nt,
            "n": self.next,
            "bt": HexNum(bt),
            "b": self.witnesses,
            "c": self.config,
            "a": self.data,
        });
        if let (Some(di), Value::Object(map)) = (self.delegator, &mut body) {
            map.insert("di".into(), Value::String(di));
        }

        let labels: &[&str] = if transferable {
            &[SAID_LABEL, "i"]
        } else {
            &[SAID_LABEL]
        };
        finish(body, self.kind, labels)
    }
}

/// Builder for rotation (`rot`) and delegated rotation (`drt`) events.
#[derive(Debug, Clone)]
pub struct RotationBuilder {
    prefix: String,
    sn: u64,
    prior: String,
    keys: Vec<String>,
    kt: Option<Threshold>,
    next: Vec<String>,
    nt: Option<Threshold>,
    toad: Option<u64>,
    cuts: Vec<String>,
    adds: Vec<String>,
    current_witnesses: usize,
    data: Vec<Value>,
    delegated: bool,
    kind: Kind,
}

impl RotationBuilder {
    /// Start a rotation following `state`.
    pub fn new(state: &KeyState, keys: Vec<String>) -> Self {
        let sn = HexNum::from_hex(&state.s).map(|s| s.value() + 1).unwrap_or(0);
        Self {
            prefix: state.i.clone(),
            sn,
            prior: state.d.clone(),
            keys,
            kt: None,
            next: Vec::new(),
            nt: None,
            toad: None,
            cuts: Vec::new(),
            adds: Vec::new(),
            current_witnesses: state.b.len(),
            data: Vec::new(),
            delegated: !state.di.is_empty(),
            kind: Kind::Json,
        }
    }

    pub fn key_threshold(mut self, kt: Threshold) -> Self {
        self.kt = Some(kt);
        self
    }

    pub fn next_digests(mut self, n: Vec<String>) -> Self {
        self.next = n;
        self
    }

    pub fn next_threshold(mut self, nt: Threshold) -> Self {
        self.nt = Some(nt);
        self
    }

    pub fn witness_threshold(mut self, toad: u64) -> Self {
        self.toad = Some(toad);
        self
    }

    /// Witnesses to remove.
    pub fn cuts(mut self, br: Vec<String>) -> Self {
        self.cuts = br;
        self
    }

    /// Witnesses to add.
    pub fn adds(mut self, ba: Vec<String>) -> Self {
        self.adds = ba;
        self
    }

    pub fn data(mut self, a: Vec<Value>) -> Self {
        self.data = a;
        self
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    /// Build the event, computing its SAID.
    pub fn build(self) -> Result<RotationEvent, EventError> {
        if self.keys.is_empty() {
            return Err(EventError::NoKeys);
        }
        let ilk = if self.delegated { Ilk::Drt } else { Ilk::Rot };
        let kt = self
            .kt
            .unwrap_or_else(|| Threshold::simple(self.keys.len() as u64));
        let nt = self
            .nt
            .unwrap_or_else(|| Threshold::simple(self.next.len() as u64));
        let witnesses = (self.current_witnesses + self.adds.len()).saturating_sub(self.cuts.len());
        let bt = self
            .toad
            .unwrap_or_else(|| default_backer_threshold(witnesses));

        let body = json!({
            "v": "",
            "t": ilk,
            "d": "",
            "i": self.prefix,
            "s": HexNum(self.sn),
            "p": self.prior,
            "kt": kt,
            "k": self.keys,
            "nt": nt,
            "n": self.next,
            "bt": HexNum(bt),
            "br": self.cuts,
            "ba": self.adds,
            "a": self.data,
        });
        finish(body, self.kind, &[SAID_LABEL])
    }
}

/// Build an interaction event following `state`.
pub fn interact(state: &KeyState, data: Vec<Value>) -> Result<InteractionEvent, EventError> {
    let sn = HexNum::from_hex(&state.s)
        .map(|s| s.next())
        .ok_or(EventError::MissingField("s"))?;
    let body = json!({
        "v": "",
        "t": Ilk::Ixn,
        "d": "",
        "i": state.i,
        "s": sn,
        "p": state.d,
        "a": data,
    });
    finish(body, Kind::Json, &[SAID_LABEL])
}

/// Build a receipt for the event `said` at `sn` of `prefix`.
pub fn receipt(prefix: &str, sn: HexNum, said: &str) -> Result<ReceiptEvent, EventError> {
    let body = json!({
        "v": "",
        "t": Ilk::Rct,
        "d": said,
        "i": prefix,
        "s": sn,
    });
    finish(body, Kind::Json, &[])
}

/// Build a reply on `route` carrying `data`.
pub fn reply(route: &str, data: Value, dt: DateTime<Utc>) -> Result<ReplyEvent, EventError> {
    let mut body = Map::new();
    body.insert("v".into(), Value::String(String::new()));
    body.insert("t".into(), json!(Ilk::Rpy));
    body.insert("d".into(), Value::String(String::new()));
    body.insert("dt".into(), Value::String(format_datetime(&dt)));
    body.insert("r".into(), Value::String(route.to_string()));
    body.insert("a".into(), data);
    finish(Value::Object(body), Kind::Json, &[SAID_LABEL])
}

/// Build a query on `route`. Answers go to `return_route`, which may be
/// empty.
pub fn query(
    route: &str,
    return_route: &str,
    q: Value,
    dt: DateTime<Utc>,
) -> Result<QueryEvent, EventError> {
    let mut body = Map::new();
    body.insert("v".into(), Value::String(String::new()));
    body.insert("t".into(), json!(Ilk::Qry));
    body.insert("d".into(), Value::String(String::new()));
    body.insert("dt".into(), Value::String(format_datetime(&dt)));
    body.insert("r".into(), Value::String(route.to_string()));
    body.insert("rr".into(), Value::String(return_route.to_string()));
    body.insert("q".into(), q);
    finish(Value::Object(body), Kind::Json, &[SAID_LABEL])
}
