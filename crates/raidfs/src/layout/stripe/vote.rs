//! Plurality vote among mirror fingerprints.

/// `elect` returns the index of the disk whose fingerprint has the most
/// agreeing peers. Ties go to the lowest index; disks that produced no
/// fingerprint (`None`) do not vote.
///
/// # Arguments
/// * `prints` - One optional fingerprint per disk, in device order.
///
/// # Returns
/// The winning disk index, or `None` if no disk produced a fingerprint.
pub fn elect<V: Eq>(prints: &[Option<V>]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, print) in prints.iter().enumerate() {
        let Some(print) = print else {
            continue;
        };
        let agreeing = prints
            .iter()
            .filter(|other| other.as_ref() == Some(print))
            .count();
        if best.is_none_or(|(_, count)| agreeing > count) {
            best = Some((i, agreeing));
        }
    }
    best.map(|(i, _)| i)
}

/// `dissenters` lists the voting disks whose fingerprint differs from the
/// winner's.
pub fn dissenters<V: Eq>(prints: &[Option<V>], winner: usize) -> Vec<usize> {
    let Some(Some(won)) = prints.get(winner) else {
        return Vec::new();
    };
    prints
        .iter()
        .enumerate()
        .filter_map(|(i, p)| match p {
            Some(p) if p != won => Some(i),
            _ => None,
        })
        .collect()
}
