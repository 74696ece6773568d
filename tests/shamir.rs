use proptest::prelude::*;
use vault_ledger::crypto::shamir::{
    Share, SharingError, SharingParams, combine, decode_share_set, encode_share_set, split,
};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

#[test]
fn split_and_combine_roundtrip() {
    let secret = b"threshold escrow";

    let shares = split(secret, 5, 3).unwrap();
    assert_eq!(shares.len(), 5);

    let recovered = combine(&shares[..3]).unwrap().to_vec();
    assert_eq!(recovered, secret);
}

#[test]
fn combine_order_independent() {
    let secret = b"order does not matter";

    let shares = split(secret, 5, 3).unwrap();
    let picked = [shares[4].clone(), shares[1].clone(), shares[3].clone()];

    assert_eq!(combine(&picked).unwrap().to_vec(), secret);
}

#[test]
fn more_than_threshold_still_reconstructs() {
    let secret = b"all five";
    let shares = split(secret, 5, 3).unwrap();
    assert_eq!(combine(&shares).unwrap().to_vec(), secret);
}

#[test]
fn key_survives_losing_two_of_five_shares() {
    let key: Vec<u8> = (0u8..32).map(|b| b.wrapping_mul(37).wrapping_add(11)).collect();

    let mut shares = split(&key, 5, 3).unwrap();
    shares.remove(0);
    shares.remove(2);
    assert_eq!(shares.len(), 3);

    assert_eq!(combine(&shares).unwrap().to_vec(), key);
}

#[test]
fn below_threshold_yields_a_wrong_value_not_an_error() {
    let key = [0x5au8; 32];
    let shares = split(&key, 5, 3).unwrap();

    let recovered = combine(&shares[..2]).unwrap().to_vec();
    assert_eq!(recovered.len(), key.len());
    assert_ne!(recovered, key);
}

#[test]
fn invalid_parameters_are_rejected() {
    assert!(matches!(
        split(b"s", 3, 4),
        Err(SharingError::InvalidParameters(_))
    ));
    assert!(matches!(
        split(b"s", 3, 1),
        Err(SharingError::InvalidParameters(_))
    ));
    assert!(matches!(
        split(b"", 5, 3),
        Err(SharingError::InvalidParameters(_))
    ));
    assert!(SharingParams::new(5, 3).is_ok());
    assert_eq!(SharingParams::default(), SharingParams::new(5, 3).unwrap());
}

#[test]
fn structurally_broken_share_sets_are_malformed() {
    let shares = split(b"duplicate ids", 5, 3).unwrap();

    let duplicated = [shares[0].clone(), shares[0].clone(), shares[1].clone()];
    assert!(matches!(combine(&duplicated), Err(SharingError::Malformed(_))));

    let mut short = shares[2].clone();
    short.data.pop();
    let mixed = [shares[0].clone(), shares[1].clone(), short];
    assert!(matches!(combine(&mixed), Err(SharingError::Malformed(_))));

    assert!(matches!(combine(&[]), Err(SharingError::InvalidParameters(_))));
}

#[test]
fn shares_and_recovered_secret_are_wiped() {
    fn wiped_on_drop<T: ZeroizeOnDrop>(_: &T) {}

    let shares = split(b"wipe me", 3, 2).unwrap();
    wiped_on_drop(&shares[0]);

    let recovered: Zeroizing<Vec<u8>> = combine(&shares[1..]).unwrap();
    assert_eq!(recovered.as_slice(), b"wipe me");

    let mut share = shares[1].clone();
    share.zeroize();
    assert_eq!(share.id, 0);
    assert!(share.data.is_empty());
}

#[test]
fn share_tokens_survive_the_ledger_encoding() {
    let secret = [7u8; 32];
    let shares = split(&secret, 5, 3).unwrap();

    let stored = encode_share_set(&shares);
    let tokens: Vec<String> = serde_json::from_str(&stored).unwrap();
    let picked: Vec<Share> = tokens[2..]
        .iter()
        .map(|t| Share::decode(t).unwrap())
        .collect();

    assert_eq!(combine(&picked).unwrap().to_vec(), secret);
    assert_eq!(decode_share_set(&stored).unwrap(), shares);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_threshold_subset_reconstructs(
        secret in proptest::collection::vec(any::<u8>(), 1..48),
        (n, k) in (2u8..8).prop_flat_map(|n| (Just(n), 2u8..=n)),
        seed in any::<u64>(),
    ) {
        let shares = split(&secret, n, k).unwrap();

        // pick k distinct shares, rotating by the seed
        let start = (seed % n as u64) as usize;
        let subset: Vec<Share> = (0..k as usize)
            .map(|i| shares[(start + i) % n as usize].clone())
            .collect();

        prop_assert_eq!(combine(&subset).unwrap().to_vec(), secret);
    }

    #[test]
    fn one_share_short_does_not_leak_a_long_secret(
        secret in proptest::collection::vec(any::<u8>(), 16..48),
        (n, k) in (3u8..8).prop_flat_map(|n| (Just(n), 3u8..=n)),
    ) {
        let shares = split(&secret, n, k).unwrap();
        let partial = combine(&shares[..k as usize - 1]).unwrap().to_vec();
        prop_assert_ne!(partial, secret);
    }
}
