//! Next-token selection over a raw logit row. Kept free of tensor types so
//! the decode math is unit-testable without a model checkpoint.

use rand::Rng;

use crate::model::GenerationParams;

pub fn argmax(logits: &[f32]) -> usize {
    let mut best = 0;
    for (idx, &logit) in logits.iter().enumerate() {
        if logit > logits[best] {
            best = idx;
        }
    }
    best
}

/// HF-style repetition penalty: positive logits of already-emitted tokens are
/// divided by the penalty, negative ones multiplied, pushing both away from
/// re-selection.
pub fn apply_repetition_penalty(logits: &mut [f32], seen: &[i64], penalty: f32) {
    if (penalty - 1.0).abs() < f32::EPSILON {
        return;
    }
    for &id in seen {
        let Some(logit) = logits.get_mut(id as usize) else {
            continue;
        };
        if *logit > 0.0 {
            *logit /= penalty;
        } else {
            *logit *= penalty;
        }
    }
}

/// Draws one token id: temperature scaling, top-k truncation, top-p nucleus
/// filtering, then a weighted draw. Falls back to argmax when sampling is
/// disabled.
pub fn sample_token<R: Rng>(logits: &[f32], params: &GenerationParams, rng: &mut R) -> usize {
    if !params.do_sample {
        return argmax(logits);
    }

    let temperature = (params.temperature as f32).max(f32::EPSILON);
    let mut candidates: Vec<(usize, f32)> = logits
        .iter()
        .enumerate()
        .map(|(idx, &logit)| (idx, logit / temperature))
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

    if params.top_k > 0 && params.top_k < candidates.len() {
        candidates.truncate(params.top_k);
    }

    let max_logit = candidates[0].1;
    let mut probs: Vec<f32> = candidates
        .iter()
        .map(|&(_, logit)| (logit - max_logit).exp())
        .collect();
    let total: f32 = probs.iter().sum();
    for p in &mut probs {
        *p /= total;
    }

    if params.top_p < 1.0 {
        let top_p = params.top_p as f32;
        let mut cumulative = 0.0;
        let mut keep = probs.len();
        for (idx, p) in probs.iter().enumerate() {
            cumulative += p;
            if cumulative >= top_p {
                keep = idx + 1;
                break;
            }
        }
        probs.truncate(keep);
        candidates.truncate(keep);
        let total: f32 = probs.iter().sum();
        for p in &mut probs {
            *p /= total;
        }
    }

    let draw: f32 = rng.gen_range(0.0..1.0);
    let mut cumulative = 0.0;
    for (idx, p) in probs.iter().enumerate() {
        cumulative += p;
        if draw < cumulative {
            return candidates[idx].0;
        }
    }
    candidates[candidates.len() - 1].0
}
