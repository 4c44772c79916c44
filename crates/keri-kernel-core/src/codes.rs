//! CESR code tables.
//!
//! Every primitive on the wire begins with a short code that maps to a fixed
//! set of sizes. The three families (Matter, Indexer, Counter) share the same
//! entry shape; only the meaning of `xs` differs (Indexer stores the ondex
//! width there).
//!
//! Sizes are in base64 characters, except `ls` which is in bytes.

use std::fmt;

/// Sizes for one code table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizage {
    /// Hard size: length of the code itself.
    pub hs: usize,
    /// Soft size: length of the variable part following the code.
    pub ss: usize,
    /// Extra size within the soft part (ondex width for indexed codes).
    pub xs: usize,
    /// Full size of the primitive, or `None` for variable-length codes.
    pub fs: Option<usize>,
    /// Lead size: zero bytes prepended to the raw value before encoding.
    pub ls: usize,
}

impl Sizage {
    const fn fixed(hs: usize, ss: usize, fs: usize, ls: usize) -> Self {
        Self {
            hs,
            ss,
            xs: 0,
            fs: Some(fs),
            ls,
        }
    }

    const fn indexed(hs: usize, ss: usize, os: usize, fs: usize) -> Self {
        Self {
            hs,
            ss,
            xs: os,
            fs: Some(fs),
            ls: 0,
        }
    }

    const fn variable(hs: usize, ss: usize, ls: usize) -> Self {
        Self {
            hs,
            ss,
            xs: 0,
            fs: None,
            ls,
        }
    }

    /// Code size: hard plus soft.
    pub const fn cs(&self) -> usize {
        self.hs + self.ss
    }

    /// Whether this entry has a fixed full size.
    pub const fn is_fixed(&self) -> bool {
        self.fs.is_some()
    }

    /// Raw byte length implied by a fixed full size.
    pub fn raw_size(&self) -> Option<usize> {
        self.fs.map(|fs| (fs - self.cs()) * 3 / 4 - self.ls)
    }
}

/// Code table family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Matter,
    Indexer,
    Counter,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Matter => write!(f, "matter"),
            Family::Indexer => write!(f, "indexer"),
            Family::Counter => write!(f, "counter"),
        }
    }
}

/// One named code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub sizage: Sizage,
}

/// A static, read-only code table.
#[derive(Debug)]
pub struct CodeTable {
    family: Family,
    entries: &'static [CodeEntry],
}

impl CodeTable {
    /// The family this table belongs to.
    pub const fn family(&self) -> Family {
        self.family
    }

    /// Look up the entry for an exact code.
    pub fn get(&self, code: &str) -> Option<&'static CodeEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// Sizes for an exact code.
    pub fn sizage(&self, code: &str) -> Option<Sizage> {
        self.get(code).map(|e| e.sizage)
    }

    /// Whether the exact code is present.
    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Find the entry whose code is a prefix of `text`, scanning one to four
    /// leading characters. The first (shortest) match wins.
    pub fn match_prefix(&self, text: &str) -> Option<&'static CodeEntry> {
        (1..=4)
            .take_while(|&n| n <= text.len())
            .filter_map(|n| text.get(..n))
            .find_map(|prefix| self.get(prefix))
    }

    /// All entries in the table.
    pub fn iter(&self) -> impl Iterator<Item = &'static CodeEntry> {
        self.entries.iter()
    }
}

macro_rules! code_consts {
    ($( $(#[$meta:meta])* $name:ident = $code:expr ;)*) => {
        $( $(#[$meta])* pub const $name: &str = $code; )*
    };
}

/// Matter (plain primitive) codes.
pub mod matter {
    code_consts! {
        ED25519_SEED = "A";
        /// Ed25519 non-transferable prefix public key.
        ED25519N = "B";
        X25519 = "C";
        /// Ed25519 transferable public key.
        ED25519 = "D";
        BLAKE3_256 = "E";
        BLAKE2B_256 = "F";
        BLAKE2S_256 = "G";
        SHA3_256 = "H";
        SHA2_256 = "I";
        ECDSA_256K1_SEED = "J";
        ED448_SEED = "K";
        X448 = "L";
        SHORT = "M";
        BIG = "N";
        X25519_PRIVATE = "O";
        X25519_CIPHER_SEED = "P";
        ECDSA_256R1_SEED = "Q";
        TALL = "R";
        LARGE = "S";
        GREAT = "T";
        VAST = "U";
        LABEL1 = "V";
        LABEL2 = "W";
        SALT_128 = "0A";
        ED25519_SIG = "0B";
        ECDSA_256K1_SIG = "0C";
        BLAKE3_512 = "0D";
        BLAKE2B_512 = "0E";
        SHA3_512 = "0F";
        SHA2_512 = "0G";
        LONG = "0H";
        ECDSA_256R1_SIG = "0I";
        ECDSA_256K1N = "1AAA";
        ECDSA_256K1 = "1AAB";
        ED448N = "1AAC";
        ED448 = "1AAD";
        ED448_SIG = "1AAE";
        DATE_TIME = "1AAG";
        X25519_CIPHER_SALT = "1AAH";
        ECDSA_256R1N = "1AAI";
        ECDSA_256R1 = "1AAJ";
        NULL = "1AAK";
        NO = "1AAL";
        YES = "1AAM";
        EMPTY = "1AAP";
        STR_B64_L0 = "4A";
        STR_B64_L1 = "5A";
        STR_B64_L2 = "6A";
        STR_B64_BIG_L0 = "7AAA";
        STR_B64_BIG_L1 = "8AAA";
        STR_B64_BIG_L2 = "9AAA";
        BYTES_L0 = "4B";
        BYTES_L1 = "5B";
        BYTES_L2 = "6B";
        BYTES_BIG_L0 = "7AAB";
        BYTES_BIG_L1 = "8AAB";
        BYTES_BIG_L2 = "9AAB";
        X25519_CIPHER_L0 = "4C";
        X25519_CIPHER_L1 = "5C";
        X25519_CIPHER_L2 = "6C";
        X25519_CIPHER_BIG_L0 = "7AAC";
        X25519_CIPHER_BIG_L1 = "8AAC";
        X25519_CIPHER_BIG_L2 = "9AAC";
    }
}

/// Indexer (indexed signature) codes.
pub mod indexer {
    code_consts! {
        ED25519_SIG = "A";
        ED25519_CRT_SIG = "B";
        ECDSA_256K1_SIG = "C";
        ECDSA_256K1_CRT_SIG = "D";
        ECDSA_256R1_SIG = "E";
        ECDSA_256R1_CRT_SIG = "F";
        ED448_SIG = "0A";
        ED448_CRT_SIG = "0B";
        ED25519_BIG_SIG = "2A";
        ED25519_BIG_CRT_SIG = "2B";
        ECDSA_256K1_BIG_SIG = "2C";
        ECDSA_256K1_BIG_CRT_SIG = "2D";
        ECDSA_256R1_BIG_SIG = "2E";
        ECDSA_256R1_BIG_CRT_SIG = "2F";
        ED448_BIG_SIG = "3A";
        ED448_BIG_CRT_SIG = "3B";
    }
}

/// Counter (group) codes.
pub mod counter {
    code_consts! {
        CONTROLLER_IDX_SIGS = "-A";
        WITNESS_IDX_SIGS = "-B";
        NON_TRANS_RECEIPT_COUPLES = "-C";
        TRANS_RECEIPT_QUADRUPLES = "-D";
        FIRST_SEEN_REPLAY_COUPLES = "-E";
        TRANS_IDX_SIG_GROUPS = "-F";
        SEAL_SOURCE_COUPLES = "-G";
        TRANS_LAST_IDX_SIG_GROUPS = "-H";
        SEAL_SOURCE_TRIPLES = "-I";
        SAD_PATH_SIG_GROUPS = "-J";
        SAD_PATH_SIG = "-K";
        PATHED_MATERIAL_GROUP = "-L";
        ATTACHMENT_GROUP = "-V";
        ESSR_PAYLOAD_GROUP = "-Z";
        BIG_PATHED_MATERIAL_GROUP = "-0L";
        BIG_ATTACHMENT_GROUP = "-0V";
        BIG_ESSR_PAYLOAD_GROUP = "-0Z";
    }
}

macro_rules! entry {
    ($code:expr, $name:expr, $sizage:expr) => {
        CodeEntry {
            code: $code,
            name: $name,
            sizage: $sizage,
        }
    };
}

const fn one(fs: usize) -> Sizage {
    Sizage::fixed(1, 0, fs, 0)
}

const fn two(fs: usize) -> Sizage {
    Sizage::fixed(2, 0, fs, 0)
}

const fn four(fs: usize) -> Sizage {
    Sizage::fixed(4, 0, fs, 0)
}

static MATTER_ENTRIES: &[CodeEntry] = &[
    entry!(matter::ED25519_SEED, "Ed25519_Seed", one(44)),
    entry!(matter::ED25519N, "Ed25519N", one(44)),
    entry!(matter::X25519, "X25519", one(44)),
    entry!(matter::ED25519, "Ed25519", one(44)),
    entry!(matter::BLAKE3_256, "Blake3_256", one(44)),
    entry!(matter::BLAKE2B_256, "Blake2b_256", one(44)),
    entry!(matter::BLAKE2S_256, "Blake2s_256", one(44)),
    entry!(matter::SHA3_256, "SHA3_256", one(44)),
    entry!(matter::SHA2_256, "SHA2_256", one(44)),
    entry!(matter::ECDSA_256K1_SEED, "ECDSA_256k1_Seed", one(44)),
    entry!(matter::ED448_SEED, "Ed448_Seed", one(76)),
    entry!(matter::X448, "X448", one(76)),
    entry!(matter::SHORT, "Short", one(4)),
    entry!(matter::BIG, "Big", one(12)),
    entry!(matter::X25519_PRIVATE, "X25519_Private", one(44)),
    entry!(matter::X25519_CIPHER_SEED, "X25519_Cipher_Seed", one(124)),
    entry!(matter::ECDSA_256R1_SEED, "ECDSA_256r1_Seed", one(44)),
    entry!(matter::TALL, "Tall", one(8)),
    entry!(matter::LARGE, "Large", one(16)),
    entry!(matter::GREAT, "Great", one(20)),
    entry!(matter::VAST, "Vast", one(24)),
    entry!(matter::LABEL1, "Label1", Sizage::fixed(1, 0, 4, 1)),
    entry!(matter::LABEL2, "Label2", one(4)),
    entry!(matter::SALT_128, "Salt_128", two(24)),
    entry!(matter::ED25519_SIG, "Ed25519_Sig", two(88)),
    entry!(matter::ECDSA_256K1_SIG, "ECDSA_256k1_Sig", two(88)),
    entry!(matter::BLAKE3_512, "Blake3_512", two(88)),
    entry!(matter::BLAKE2B_512, "Blake2b_512", two(88)),
    entry!(matter::SHA3_512, "SHA3_512", two(88)),
    entry!(matter::SHA2_512, "SHA2_512", two(88)),
    entry!(matter::LONG, "Long", two(8)),
    entry!(matter::ECDSA_256R1_SIG, "ECDSA_256r1_Sig", two(88)),
    entry!(matter::ECDSA_256K1N, "ECDSA_256k1N", four(48)),
    entry!(matter::ECDSA_256K1, "ECDSA_256k1", four(48)),
    entry!(matter::ED448N, "Ed448N", four(80)),
    entry!(matter::ED448, "Ed448", four(80)),
    entry!(matter::ED448_SIG, "Ed448_Sig", four(156)),
    entry!(matter::DATE_TIME, "DateTime", four(36)),
    entry!(matter::X25519_CIPHER_SALT, "X25519_Cipher_Salt", four(100)),
    entry!(matter::ECDSA_256R1N, "ECDSA_256r1N", four(48)),
    entry!(matter::ECDSA_256R1, "ECDSA_256r1", four(48)),
    entry!(matter::NULL, "Null", four(4)),
    entry!(matter::NO, "No", four(4)),
    entry!(matter::YES, "Yes", four(4)),
    entry!(matter::EMPTY, "Empty", four(4)),
    entry!(matter::STR_B64_L0, "StrB64_L0", Sizage::variable(2, 2, 0)),
    entry!(matter::STR_B64_L1, "StrB64_L1", Sizage::variable(2, 2, 1)),
    entry!(matter::STR_B64_L2, "StrB64_L2", Sizage::variable(2, 2, 2)),
    entry!(matter::BYTES_L0, "Bytes_L0", Sizage::variable(2, 2, 0)),
    entry!(matter::BYTES_L1, "Bytes_L1", Sizage::variable(2, 2, 1)),
    entry!(matter::BYTES_L2, "Bytes_L2", Sizage::variable(2, 2, 2)),
    entry!(matter::X25519_CIPHER_L0, "X25519_Cipher_L0", Sizage::variable(2, 2, 0)),
    entry!(matter::X25519_CIPHER_L1, "X25519_Cipher_L1", Sizage::variable(2, 2, 1)),
    entry!(matter::X25519_CIPHER_L2, "X25519_Cipher_L2", Sizage::variable(2, 2, 2)),
    entry!(matter::STR_B64_BIG_L0, "StrB64_Big_L0", Sizage::variable(4, 4, 0)),
    entry!(matter::STR_B64_BIG_L1, "StrB64_Big_L1", Sizage::variable(4, 4, 1)),
    entry!(matter::STR_B64_BIG_L2, "StrB64_Big_L2", Sizage::variable(4, 4, 2)),
    entry!(matter::BYTES_BIG_L0, "Bytes_Big_L0", Sizage::variable(4, 4, 0)),
    entry!(matter::BYTES_BIG_L1, "Bytes_Big_L1", Sizage::variable(4, 4, 1)),
    entry!(matter::BYTES_BIG_L2, "Bytes_Big_L2", Sizage::variable(4, 4, 2)),
    entry!(matter::X25519_CIPHER_BIG_L0, "X25519_Cipher_Big_L0", Sizage::variable(4, 4, 0)),
    entry!(matter::X25519_CIPHER_BIG_L1, "X25519_Cipher_Big_L1", Sizage::variable(4, 4, 1)),
    entry!(matter::X25519_CIPHER_BIG_L2, "X25519_Cipher_Big_L2", Sizage::variable(4, 4, 2)),
];

static INDEXER_ENTRIES: &[CodeEntry] = &[
    entry!(indexer::ED25519_SIG, "Ed25519_Sig", Sizage::indexed(1, 1, 0, 88)),
    entry!(indexer::ED25519_CRT_SIG, "Ed25519_Crt_Sig", Sizage::indexed(1, 1, 0, 88)),
    entry!(indexer::ECDSA_256K1_SIG, "ECDSA_256k1_Sig", Sizage::indexed(1, 1, 0, 88)),
    entry!(indexer::ECDSA_256K1_CRT_SIG, "ECDSA_256k1_Crt_Sig", Sizage::indexed(1, 1, 0, 88)),
    entry!(indexer::ECDSA_256R1_SIG, "ECDSA_256r1_Sig", Sizage::indexed(1, 1, 0, 88)),
    entry!(indexer::ECDSA_256R1_CRT_SIG, "ECDSA_256r1_Crt_Sig", Sizage::indexed(1, 1, 0, 88)),
    entry!(indexer::ED448_SIG, "Ed448_Sig", Sizage::indexed(2, 2, 1, 156)),
    entry!(indexer::ED448_CRT_SIG, "Ed448_Crt_Sig", Sizage::indexed(2, 2, 1, 156)),
    entry!(indexer::ED25519_BIG_SIG, "Ed25519_Big_Sig", Sizage::indexed(2, 4, 2, 92)),
    entry!(indexer::ED25519_BIG_CRT_SIG, "Ed25519_Big_Crt_Sig", Sizage::indexed(2, 4, 2, 92)),
    entry!(indexer::ECDSA_256K1_BIG_SIG, "ECDSA_256k1_Big_Sig", Sizage::indexed(2, 4, 2, 92)),
    entry!(indexer::ECDSA_256K1_BIG_CRT_SIG, "ECDSA_256k1_Big_Crt_Sig", Sizage::indexed(2, 4, 2, 92)),
    entry!(indexer::ECDSA_256R1_BIG_SIG, "ECDSA_256r1_Big_Sig", Sizage::indexed(2, 4, 2, 92)),
    entry!(indexer::ECDSA_256R1_BIG_CRT_SIG, "ECDSA_256r1_Big_Crt_Sig", Sizage::indexed(2, 4, 2, 92)),
    entry!(indexer::ED448_BIG_SIG, "Ed448_Big_Sig", Sizage::indexed(2, 6, 3, 160)),
    entry!(indexer::ED448_BIG_CRT_SIG, "Ed448_Big_Crt_Sig", Sizage::indexed(2, 6, 3, 160)),
];

const fn small_counter() -> Sizage {
    Sizage::fixed(2, 2, 4, 0)
}

const fn big_counter() -> Sizage {
    Sizage::fixed(3, 5, 8, 0)
}

static COUNTER_ENTRIES: &[CodeEntry] = &[
    entry!(counter::CONTROLLER_IDX_SIGS, "ControllerIdxSigs", small_counter()),
    entry!(counter::WITNESS_IDX_SIGS, "WitnessIdxSigs", small_counter()),
    entry!(counter::NON_TRANS_RECEIPT_COUPLES, "NonTransReceiptCouples", small_counter()),
    entry!(counter::TRANS_RECEIPT_QUADRUPLES, "TransReceiptQuadruples", small_counter()),
    entry!(counter::FIRST_SEEN_REPLAY_COUPLES, "FirstSeenReplayCouples", small_counter()),
    entry!(counter::TRANS_IDX_SIG_GROUPS, "TransIdxSigGroups", small_counter()),
    entry!(counter::SEAL_SOURCE_COUPLES, "SealSourceCouples", small_counter()),
    entry!(counter::TRANS_LAST_IDX_SIG_GROUPS, "TransLastIdxSigGroups", small_counter()),
    entry!(counter::SEAL_SOURCE_TRIPLES, "SealSourceTriples", small_counter()),
    entry!(counter::SAD_PATH_SIG_GROUPS, "SadPathSigGroups", small_counter()),
    entry!(counter::SAD_PATH_SIG, "SadPathSig", small_counter()),
    entry!(counter::PATHED_MATERIAL_GROUP, "PathedMaterialGroup", small_counter()),
    entry!(counter::ATTACHMENT_GROUP, "AttachmentGroup", small_counter()),
    entry!(counter::ESSR_PAYLOAD_GROUP, "ESSRPayloadGroup", small_counter()),
    entry!(counter::BIG_PATHED_MATERIAL_GROUP, "BigPathedMaterialGroup", big_counter()),
    entry!(counter::BIG_ATTACHMENT_GROUP, "BigAttachmentGroup", big_counter()),
    entry!(counter::BIG_ESSR_PAYLOAD_GROUP, "BigESSRPayloadGroup", big_counter()),
];

/// Plain primitives: keys, digests, signatures, dates, strings.
pub static MATTER: CodeTable = CodeTable {
    family: Family::Matter,
    entries: MATTER_ENTRIES,
};

/// Indexed signatures.
pub static INDEXER: CodeTable = CodeTable {
    family: Family::Indexer,
    entries: INDEXER_ENTRIES,
};

/// Group-introducing counters.
pub static COUNTER: CodeTable = CodeTable {
    family: Family::Counter,
    entries: COUNTER_ENTRIES,
};

/// The table for a family.
pub fn table(family: Family) -> &'static CodeTable {
    match family {
        Family::Matter => &MATTER,
        Family::Indexer => &INDEXER,
        Family::Counter => &COUNTER,
    }
}

/// Signature codes paired with their small and big indexed codes.
pub(crate) static INDEX_PAIRS: &[(&str, &str, &str)] = &[
    (matter::ED25519_SIG, indexer::ED25519_SIG, indexer::ED25519_BIG_SIG),
    (matter::ECDSA_256K1_SIG, indexer::ECDSA_256K1_SIG, indexer::ECDSA_256K1_BIG_SIG),
    (matter::ECDSA_256R1_SIG, indexer::ECDSA_256R1_SIG, indexer::ECDSA_256R1_BIG_SIG),
    (matter::ED448_SIG, indexer::ED448_SIG, indexer::ED448_BIG_SIG),
];

/// Current-only indexed codes and the signature code they carry.
pub(crate) static CURRENT_ONLY: &[(&str, &str)] = &[
    (indexer::ED25519_CRT_SIG, matter::ED25519_SIG),
    (indexer::ED25519_BIG_CRT_SIG, matter::ED25519_SIG),
    (indexer::ECDSA_256K1_CRT_SIG, matter::ECDSA_256K1_SIG),
    (indexer::ECDSA_256K1_BIG_CRT_SIG, matter::ECDSA_256K1_SIG),
    (indexer::ECDSA_256R1_CRT_SIG, matter::ECDSA_256R1_SIG),
    (indexer::ECDSA_256R1_BIG_CRT_SIG, matter::ECDSA_256R1_SIG),
    (indexer::ED448_CRT_SIG, matter::ED448_SIG),
    (indexer::ED448_BIG_CRT_SIG, matter::ED448_SIG),
];
