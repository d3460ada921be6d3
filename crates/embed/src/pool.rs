use crate::EmbedError;

/// Average the token vectors of one sequence, ignoring padded positions.
///
/// `hidden` is the flattened `[seq_len, hidden_dim]` block. With no padding
/// this is the plain mean over every token, special tokens included.
pub fn mean_pool(
    hidden: &[f32],
    seq_len: usize,
    hidden_dim: usize,
    mask: &[i64],
) -> Result<Vec<f32>, EmbedError> {
    if hidden.len() != seq_len * hidden_dim {
        return Err(EmbedError::Inference(format!(
            "hidden state has {} values, expected {seq_len}x{hidden_dim}",
            hidden.len()
        )));
    }
    if mask.len() != seq_len {
        return Err(EmbedError::Inference(format!(
            "attention mask has {} entries for {seq_len} tokens",
            mask.len()
        )));
    }

    let mut pooled = vec![0.0f32; hidden_dim];
    let mut counted = 0usize;
    for (token, &m) in hidden.chunks(hidden_dim.max(1)).zip(mask) {
        if m == 0 {
            continue;
        }
        counted += 1;
        for (acc, &val) in pooled.iter_mut().zip(token) {
            *acc += val;
        }
    }

    if counted == 0 {
        return Err(EmbedError::Inference(
            "attention mask selects no tokens".into(),
        ));
    }
    let n = counted as f32;
    for val in &mut pooled {
        *val /= n;
    }
    Ok(pooled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_every_unmasked_token() {
        let hidden = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let pooled = mean_pool(&hidden, 3, 2, &[1, 1, 1]).unwrap();
        assert_eq!(pooled, vec![3.0, 4.0]);
    }

    #[test]
    fn padded_tokens_are_skipped() {
        let hidden = [1.0, 1.0, 3.0, 3.0, 100.0, 100.0];
        let pooled = mean_pool(&hidden, 3, 2, &[1, 1, 0]).unwrap();
        assert_eq!(pooled, vec![2.0, 2.0]);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        assert!(mean_pool(&[1.0, 2.0, 3.0], 2, 2, &[1, 1]).is_err());
        assert!(mean_pool(&[1.0, 2.0], 1, 2, &[1, 1]).is_err());
    }

    #[test]
    fn all_masked_is_an_error() {
        assert!(mean_pool(&[1.0, 2.0], 1, 2, &[0]).is_err());
    }
}
