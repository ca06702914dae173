//! Kubernetes resource quantity conversion
//!
//! The metrics API reports CPU as nanocores ("250000000n"), millicores
//! ("500m") or whole cores ("2"), and memory with binary suffixes
//! ("256Mi"). Everything is normalized to millicores and mebibytes.

use crate::error::MonitorError;

/// Parse a CPU quantity string into millicores.
///
/// Suffix `n` is nanocores (1e-6 millicores), `m` is millicores,
/// a bare number is whole cores.
pub fn cpu_to_millicores(quantity: &str) -> Result<f64, MonitorError> {
    let s = quantity.trim();

    let parse = |payload: &str| -> Result<f64, MonitorError> {
        payload.parse::<f64>().map_err(|_| MonitorError::Parse {
            what: "cpu",
            raw: quantity.to_string(),
        })
    };

    if let Some(payload) = s.strip_suffix('n') {
        return Ok(parse(payload)? / 1_000_000.0);
    }
    if let Some(payload) = s.strip_suffix('m') {
        return parse(payload);
    }
    Ok(parse(s)? * 1000.0)
}

/// Parse a memory quantity string into mebibytes.
///
/// Deliberately lenient: memory is advisory, not alerting-critical,
/// so any malformed value becomes 0.0 instead of an error.
pub fn mem_to_mebibytes(quantity: &str) -> f64 {
    let s = quantity.trim().to_lowercase();

    let parse = |payload: &str| payload.parse::<f64>().ok();

    let mib = if let Some(payload) = s.strip_suffix("ki") {
        parse(payload).map(|v| v / 1024.0)
    } else if let Some(payload) = s.strip_suffix("mi") {
        parse(payload)
    } else if let Some(payload) = s.strip_suffix("gi") {
        parse(payload).map(|v| v * 1024.0)
    } else if let Some(payload) = s.strip_suffix("ti") {
        parse(payload).map(|v| v * 1024.0 * 1024.0)
    } else {
        // bare bytes
        parse(&s).map(|v| v / (1024.0 * 1024.0))
    };

    mib.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_millicore_suffix() {
        assert_eq!(cpu_to_millicores("500m").unwrap(), 500.0);
        assert_eq!(cpu_to_millicores("0m").unwrap(), 0.0);
    }

    #[test]
    fn test_cpu_nanocore_suffix() {
        assert_eq!(cpu_to_millicores("250000000n").unwrap(), 250.0);
        assert_eq!(cpu_to_millicores("1000000n").unwrap(), 1.0);
    }

    #[test]
    fn test_cpu_whole_cores() {
        assert_eq!(cpu_to_millicores("2").unwrap(), 2000.0);
        assert_eq!(cpu_to_millicores("0.5").unwrap(), 500.0);
    }

    #[test]
    fn test_cpu_trims_whitespace() {
        assert_eq!(cpu_to_millicores(" 100m ").unwrap(), 100.0);
    }

    #[test]
    fn test_cpu_rejects_garbage() {
        let err = cpu_to_millicores("abcm").unwrap_err();
        assert!(matches!(err, MonitorError::Parse { what: "cpu", .. }));
        assert!(cpu_to_millicores("").is_err());
    }

    #[test]
    fn test_mem_suffixes() {
        assert_eq!(mem_to_mebibytes("1024Ki"), 1.0);
        assert_eq!(mem_to_mebibytes("256Mi"), 256.0);
        assert_eq!(mem_to_mebibytes("2Gi"), 2048.0);
        assert_eq!(mem_to_mebibytes("1Ti"), 1024.0 * 1024.0);
    }

    #[test]
    fn test_mem_bare_bytes() {
        assert_eq!(mem_to_mebibytes("1048576"), 1.0);
    }

    #[test]
    fn test_mem_lenient_on_garbage() {
        assert_eq!(mem_to_mebibytes("not-a-number"), 0.0);
        assert_eq!(mem_to_mebibytes(""), 0.0);
    }
}
