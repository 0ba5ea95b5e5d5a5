use crate::types::models::{HolderRecord, HoldersDistribution};

pub const CUTOFFS: [usize; 4] = [10, 25, 50, 100];

/// Concentration and rank heuristics derived from one holder list.
///
/// `dev` is simply the largest holder and `creator_amount` the second largest.
/// Nothing on-chain ties either address to the token's deployer; the fields are
/// labels for ranks, not verified identities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolderAnalysis {
    pub distribution: HoldersDistribution,
    pub dev: Option<HolderRecord>,
    pub creator_amount: Option<u64>,
}

/// Percentages are relative to the sum of the holders passed in, not to the mint's
/// circulating supply. The input is re-ranked by amount (stable, so ties keep ledger
/// order) because the ledger's own ordering is not trusted.
pub fn analyze(holders: &[HolderRecord]) -> HolderAnalysis {
    let mut ranked: Vec<&HolderRecord> = holders.iter().collect();
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount));

    let total: u128 = ranked.iter().map(|h| h.amount as u128).sum();
    let [top10, top25, top50, top100] = CUTOFFS.map(|n| top_n_percentage(&ranked, n, total));

    HolderAnalysis {
        distribution: HoldersDistribution {
            top10,
            top25,
            top50,
            top100,
        },
        dev: ranked.first().map(|h| (*h).clone()),
        creator_amount: ranked.get(1).map(|h| h.amount),
    }
}

fn top_n_percentage(ranked: &[&HolderRecord], n: usize, total: u128) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let held: u128 = ranked.iter().take(n).map(|h| h.amount as u128).sum();
    round2(held as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holders(amounts: &[u64]) -> Vec<HolderRecord> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| HolderRecord {
                owner: format!("owner{}", i),
                amount,
            })
            .collect()
    }

    fn as_array(d: &HoldersDistribution) -> [f64; 4] {
        [d.top10, d.top25, d.top50, d.top100]
    }

    #[test]
    fn fewer_holders_than_cutoff_includes_everyone() {
        let analysis = analyze(&holders(&[500, 300, 200]));
        assert_eq!(as_array(&analysis.distribution), [100.0; 4]);
        assert_eq!(analysis.dev.as_ref().unwrap().owner, "owner0");
        assert_eq!(analysis.dev.as_ref().unwrap().amount, 500);
        assert_eq!(analysis.creator_amount, Some(300));
    }

    #[test]
    fn empty_input_is_all_default() {
        let analysis = analyze(&[]);
        assert_eq!(analysis, HolderAnalysis::default());
    }

    #[test]
    fn zero_supply_gives_zero_percentages() {
        let analysis = analyze(&holders(&[0, 0]));
        assert_eq!(as_array(&analysis.distribution), [0.0; 4]);
        assert_eq!(analysis.creator_amount, Some(0));
    }

    #[test]
    fn single_holder_has_no_creator() {
        let analysis = analyze(&holders(&[42]));
        assert_eq!(analysis.creator_amount, None);
        assert_eq!(analysis.distribution.top10, 100.0);
    }

    #[test]
    fn cutoffs_are_prefix_sums_rounded_to_cents() {
        // 120 holders: ten of 1000, then 110 of 10.
        let mut amounts = vec![1000; 10];
        amounts.extend(vec![10; 110]);
        let analysis = analyze(&holders(&amounts));
        let total = 10_000.0 + 1_100.0;

        let d = &analysis.distribution;
        assert_eq!(d.top10, round2(10_000.0 / total * 100.0));
        assert_eq!(d.top25, round2(10_150.0 / total * 100.0));
        assert_eq!(d.top50, round2(10_400.0 / total * 100.0));
        assert_eq!(d.top100, round2(10_900.0 / total * 100.0));
        assert_eq!(d.top10, 90.09);
    }

    #[test]
    fn unordered_ledger_is_reranked() {
        let analysis = analyze(&holders(&[10, 700, 290]));
        assert_eq!(analysis.dev.unwrap().owner, "owner1");
        assert_eq!(analysis.creator_amount, Some(290));
    }

    #[test]
    fn percentages_are_monotonic_and_bounded() {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        for len in [0usize, 1, 9, 10, 11, 24, 26, 49, 51, 99, 101, 250] {
            let amounts: Vec<u64> = (0..len)
                .map(|_| {
                    seed ^= seed << 13;
                    seed ^= seed >> 7;
                    seed ^= seed << 17;
                    seed % 1_000_000_000_000
                })
                .collect();
            let values = as_array(&analyze(&holders(&amounts)).distribution);
            for pair in values.windows(2) {
                assert!(pair[0] <= pair[1], "len {}: {:?}", len, values);
            }
            for v in values {
                assert!((0.0..=100.0).contains(&v));
            }
        }
    }

    #[test]
    fn huge_amounts_do_not_overflow() {
        let analysis = analyze(&holders(&[u64::MAX, u64::MAX]));
        assert_eq!(analysis.distribution.top10, 100.0);
    }
}
