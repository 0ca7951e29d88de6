//! Amino-acid symbol table
//!
//! IUPAC one-letter codes for the 20 standard residues, pyrrolysine and
//! selenocysteine, the ambiguity codes B, Z, X and J, and the stop symbol.
//! Lookups go through a 256-entry table built at compile time.

use biorecord_common::{BiorecordError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum AminoAcid {
    Ala = b'A',
    Arg = b'R',
    Asn = b'N',
    Asp = b'D',
    Cys = b'C',
    Gln = b'Q',
    Glu = b'E',
    Gly = b'G',
    His = b'H',
    Ile = b'I',
    Leu = b'L',
    Lys = b'K',
    Met = b'M',
    Phe = b'F',
    Pro = b'P',
    Pyl = b'O',
    Ser = b'S',
    Sec = b'U',
    Thr = b'T',
    Trp = b'W',
    Tyr = b'Y',
    Val = b'V',
    Asx = b'B',
    Glx = b'Z',
    Xaa = b'X',
    Xle = b'J',
    Stop = b'*',
}

/// Every symbol, in the order used for composition reports
pub const ALL: [AminoAcid; 27] = [
    AminoAcid::Ala,
    AminoAcid::Arg,
    AminoAcid::Asn,
    AminoAcid::Asp,
    AminoAcid::Cys,
    AminoAcid::Gln,
    AminoAcid::Glu,
    AminoAcid::Gly,
    AminoAcid::His,
    AminoAcid::Ile,
    AminoAcid::Leu,
    AminoAcid::Lys,
    AminoAcid::Met,
    AminoAcid::Phe,
    AminoAcid::Pro,
    AminoAcid::Pyl,
    AminoAcid::Ser,
    AminoAcid::Sec,
    AminoAcid::Thr,
    AminoAcid::Trp,
    AminoAcid::Tyr,
    AminoAcid::Val,
    AminoAcid::Asx,
    AminoAcid::Glx,
    AminoAcid::Xaa,
    AminoAcid::Xle,
    AminoAcid::Stop,
];

const fn build_lookup() -> [Option<AminoAcid>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < ALL.len() {
        let symbol = ALL[i] as u8;
        table[symbol as usize] = Some(ALL[i]);
        table[symbol.to_ascii_lowercase() as usize] = Some(ALL[i]);
        i += 1;
    }
    table
}

const LOOKUP: [Option<AminoAcid>; 256] = build_lookup();

impl AminoAcid {
    /// Look up a one-letter code (either case)
    pub const fn from_byte(byte: u8) -> Option<AminoAcid> {
        LOOKUP[byte as usize]
    }

    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    pub const fn three_letter(self) -> &'static str {
        match self {
            AminoAcid::Ala => "Ala",
            AminoAcid::Arg => "Arg",
            AminoAcid::Asn => "Asn",
            AminoAcid::Asp => "Asp",
            AminoAcid::Cys => "Cys",
            AminoAcid::Gln => "Gln",
            AminoAcid::Glu => "Glu",
            AminoAcid::Gly => "Gly",
            AminoAcid::His => "His",
            AminoAcid::Ile => "Ile",
            AminoAcid::Leu => "Leu",
            AminoAcid::Lys => "Lys",
            AminoAcid::Met => "Met",
            AminoAcid::Phe => "Phe",
            AminoAcid::Pro => "Pro",
            AminoAcid::Pyl => "Pyl",
            AminoAcid::Ser => "Ser",
            AminoAcid::Sec => "Sec",
            AminoAcid::Thr => "Thr",
            AminoAcid::Trp => "Trp",
            AminoAcid::Tyr => "Tyr",
            AminoAcid::Val => "Val",
            AminoAcid::Asx => "Asx",
            AminoAcid::Glx => "Glx",
            AminoAcid::Xaa => "Xaa",
            AminoAcid::Xle => "Xle",
            AminoAcid::Stop => "Ter",
        }
    }

    /// True for the 20 residues encoded by the standard genetic code
    pub const fn is_standard(self) -> bool {
        !matches!(
            self,
            AminoAcid::Pyl
                | AminoAcid::Sec
                | AminoAcid::Asx
                | AminoAcid::Glx
                | AminoAcid::Xaa
                | AminoAcid::Xle
                | AminoAcid::Stop
        )
    }
}

/// Parse a protein sequence, rejecting the first unknown symbol
pub fn parse_protein(sequence: &str) -> Result<Vec<AminoAcid>> {
    sequence
        .bytes()
        .enumerate()
        .map(|(pos, byte)| {
            AminoAcid::from_byte(byte).ok_or_else(|| {
                BiorecordError::parse(format!(
                    "invalid amino acid symbol {:?} at position {}",
                    char::from(byte),
                    pos + 1
                ))
            })
        })
        .collect()
}

/// Residue counts in [`ALL`] order, omitting symbols that do not occur
pub fn composition(residues: &[AminoAcid]) -> Vec<(AminoAcid, usize)> {
    let mut counts = [0usize; 256];
    for residue in residues {
        counts[residue.to_byte() as usize] += 1;
    }
    ALL.iter()
        .map(|aa| (*aa, counts[aa.to_byte() as usize]))
        .filter(|(_, count)| *count > 0)
        .collect()
}
