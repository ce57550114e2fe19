//! Cross-domain sum of per-domain [`ThermoElement`]s.
//!
//! Every rank sends its reduced element to every other rank and sums all
//! contributions in rank order, so all ranks end up with bit-identical totals.
//! Intended for modest rank counts; the message volume is one element per
//! pair of ranks.

use std::collections::BTreeMap;

use crate::algs::reduce::ThermoElement;
use crate::comm::communicator::{CommTag, Communicator, Wait};
use crate::comm::wire::{cast_slice, decode_elements};
use crate::thermo_error::ThermoError;

/// Sum `local` over ranks `0..n_ranks`.
pub fn allreduce_thermo<C: Communicator>(
    comm: &C,
    my_rank: usize,
    n_ranks: usize,
    tag: CommTag,
    local: ThermoElement,
) -> Result<ThermoElement, ThermoError> {
    if my_rank >= n_ranks {
        return Err(ThermoError::CommError {
            neighbor: my_rank,
            reason: format!("rank {my_rank} outside world of {n_ranks}"),
        });
    }
    let peers = (0..n_ranks).filter(|&r| r != my_rank);
    let elem = std::mem::size_of::<ThermoElement>();

    let mut pending = BTreeMap::new();
    for peer in peers.clone() {
        let mut buf = vec![0u8; elem];
        let h = comm.irecv(peer, tag.as_u16(), &mut buf);
        pending.insert(peer, h);
    }
    let payload = [local];
    for peer in peers {
        comm.isend(peer, tag.as_u16(), cast_slice(&payload)).wait();
    }

    let mut contributions = BTreeMap::new();
    contributions.insert(my_rank, local);
    for (peer, h) in pending {
        let raw = h.wait().ok_or_else(|| ThermoError::CommError {
            neighbor: peer,
            reason: "no reduction contribution received".into(),
        })?;
        let got = decode_elements::<ThermoElement>(peer, &raw, 1)?;
        contributions.insert(peer, got[0]);
    }
    log::debug!("rank {my_rank}: combined thermo contributions of {n_ranks} ranks");
    Ok(contributions.into_values().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::communicator::NoComm;

    #[test]
    fn single_rank_is_identity() {
        let local = ThermoElement {
            momentum: [1.0, 2.0, 3.0],
            energy: 4.0,
            temperature: 5.0,
            valid: 6,
        };
        let out = allreduce_thermo(&NoComm, 0, 1, CommTag::new(0x5100), local).unwrap();
        assert_eq!(out, local);
    }

    #[test]
    fn missing_peer_is_a_comm_error() {
        let res = allreduce_thermo(&NoComm, 0, 2, CommTag::new(0x5200), ThermoElement::default());
        assert!(matches!(res, Err(ThermoError::CommError { neighbor: 1, .. })));
    }

    #[test]
    fn rank_outside_world_errors() {
        assert!(allreduce_thermo(&NoComm, 3, 2, CommTag::new(0x5300), ThermoElement::default()).is_err());
    }
}
