//! Allow-list filtering for QUIC `connection_options` tokens.
//!
//! The list is scrubbed before it leaves the process so that free-form values (which may
//! carry identifying data) never reach telemetry.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Tags recognised by the QUIC crypto handshake (`crypto_protocol.h`).
const KNOWN_CONNECTION_OPTIONS: &[&str] = &[
    "CHLO", "SHLO", "SCFG", "REJ", "CETV", "PRST", "SCUP", "ALPN", "P256", "C255", "AESG",
    "CC20", "QBIC", "AFCW", "IFW5", "IFW6", "IFW7", "IFW8", "IFW9", "IFWA", "TBBR", "1RTT",
    "2RTT", "LRTT", "BBS1", "BBS2", "BBS3", "BBS4", "BBS5", "BBRR", "BBR1", "BBR2", "BBR3",
    "BBR4", "BBR5", "BBR9", "BBRA", "BBRB", "BBRS", "BBQ1", "BBQ2", "BBQ3", "BBQ5", "BBQ6",
    "BBQ7", "BBQ8", "BBQ9", "BBQ0", "RENO", "TPCC", "BYTE", "IW03", "IW10", "IW20", "IW50",
    "B2ON", "B2NA", "B2NE", "B2RP", "B2LO", "B2HR", "B2SL", "B2H2", "B2RC", "BSAO", "B2DL",
    "B201", "B202", "B203", "B204", "B205", "B206", "B207", "NTLP", "1TLP", "1RTO", "NRTO",
    "TIME", "ATIM", "MIN1", "MIN4", "MAD0", "MAD2", "MAD3", "1ACK", "AKD3", "AKDU", "AFFE",
    "AFF1", "AFF2", "SSLR", "NPRR", "2RTO", "3RTO", "4RTO", "5RTO", "6RTO", "CBHD", "NBHD",
    "CONH", "LFAK", "STMP", "EACK", "ILD0", "ILD1", "ILD2", "ILD3", "ILD4", "RUNT", "NSTP",
    "NRTT", "1PTO", "2PTO", "6PTO", "7PTO", "8PTO", "PTOS", "PTOA", "PEB1", "PEB2", "PVS1",
    "PAG1", "PAG2", "PSDA", "PLE1", "PLE2", "APTO", "ELDT", "RVCM", "TCID", "MPTH", "NCMR",
    "DFER", "NPCO", "BWRE", "BWMX", "BWID", "BWI1", "BWRS", "BWS2", "BWS3", "BWS4", "BWS5",
    "BWS6", "BWP0", "BWP1", "BWP2", "BWP3", "BWP4", "BWG4", "BWG7", "BWG8", "BWS7", "BWM3",
    "BWM4", "ICW1", "DTOS", "FIDT", "3AFF", "10AF", "MTUH", "MTUL", "NSLC", "NCHP", "NBPE",
    "X509", "X59R", "CHID", "VER ", "NONC", "NONP", "KEXS", "AEAD", "COPT", "CLOP", "ICSL",
    "MIBS", "MIUS", "ADE ", "IRTT", "TRTT", "SNI ", "PUBS", "SCID", "ORBT", "PDMD", "PROF",
    "CCRT", "EXPY", "STTL", "SFCW", "CFCW", "UAID", "XLCT", "QLVE", "PDP1", "PDP2", "PDP3",
    "PDP5", "QNZ2", "MAD", "IGNP", "SRWP", "ROWF", "ROWR", "GSR0", "GSR1", "GSR2", "GSR3",
    "NRES", "INVC", "GWCH", "YTCH", "ACH0", "RREJ", "CADR", "ASAD", "SRST", "CIDK", "CIDS",
    "RNON", "RSEQ", "PAD ", "EPID", "SNO0", "STK0", "CRT255", "CSCT",
];

static VALID_CONNECTION_OPTIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| KNOWN_CONNECTION_OPTIONS.iter().copied().collect());

/// Whether `token` (case-insensitive, surrounding whitespace ignored) is a known tag.
#[must_use]
pub fn is_known_connection_option(token: &str) -> bool {
    let normalized = token.to_uppercase();
    VALID_CONNECTION_OPTIONS.contains(normalized.trim())
}

/// Drop every comma-separated token that is not a known connection option.
///
/// `None` and the empty string are returned unchanged. Kept tokens retain their original
/// spelling; empty segments (leading, trailing or doubled commas) never survive.
#[must_use]
pub fn filter_connection_options(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return Some(String::new());
    }

    let kept: Vec<&str> = raw
        .split(',')
        .filter(|token| is_known_connection_option(token))
        .collect();
    Some(kept.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tokens_are_dropped() {
        assert_eq!(
            filter_connection_options(Some("CHLO,bogus,ALPN")).as_deref(),
            Some("CHLO,ALPN")
        );
    }

    #[test]
    fn kept_tokens_retain_original_spelling() {
        assert_eq!(
            filter_connection_options(Some("chlo, alpn ,nope")).as_deref(),
            Some("chlo, alpn ")
        );
    }

    #[test]
    fn empty_segments_are_removed() {
        assert_eq!(
            filter_connection_options(Some(",CHLO,,ALPN,")).as_deref(),
            Some("CHLO,ALPN")
        );
        assert_eq!(filter_connection_options(Some(",,,")).as_deref(), Some(""));
    }

    #[test]
    fn null_and_empty_are_no_ops() {
        assert_eq!(filter_connection_options(None), None);
        assert_eq!(filter_connection_options(Some("")).as_deref(), Some(""));
    }

    #[test]
    fn padded_tags_never_match_after_trimming() {
        // Tokens are trimmed before lookup, so four-byte tags padded with a space are
        // unreachable.
        assert!(!is_known_connection_option("SNI "));
        assert!(!is_known_connection_option("sni"));
        assert!(is_known_connection_option("crt255"));
        assert!(is_known_connection_option(" mad "));
        assert!(!is_known_connection_option(""));
    }
}
