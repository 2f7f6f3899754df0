use std::collections::HashMap;

/// Blend physical projections with the historical profile.
///
/// The stop with the smallest physical ETA is the anchor and keeps its
/// physical value; every other upcoming stop gets the anchor plus the
/// historical spacing between itself and the anchor, clamped at zero so no
/// stop is ever predicted earlier than the one the vehicle is approaching.
/// Stops missing from the profile read as 0 elapsed minutes.
pub fn blend(
    physical: &HashMap<String, i64>,
    historical: &HashMap<String, f64>,
) -> HashMap<String, i64> {
    let mut blended = HashMap::new();

    let anchor = physical
        .iter()
        .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
    let (anchor_id, anchor_eta) = match anchor {
        Some((id, eta)) => (id.as_str(), *eta),
        None => return blended,
    };

    let anchor_elapsed = historical.get(anchor_id).copied().unwrap_or(0.0);

    for (stop_id, physical_eta) in physical {
        if stop_id == anchor_id {
            blended.insert(stop_id.clone(), *physical_eta);
            continue;
        }
        let elapsed = historical.get(stop_id).copied().unwrap_or(0.0);
        let offset = (elapsed - anchor_elapsed).max(0.0);
        blended.insert(stop_id.clone(), (anchor_eta as f64 + offset).round() as i64);
    }

    blended
}
