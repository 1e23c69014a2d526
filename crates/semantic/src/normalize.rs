/// In-place L2 normalization. Zero vectors are left untouched.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Averages the token vectors of one sequence, counting only positions whose
/// attention mask is set. `tokens` is `seq_len * dim` values, row-major.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
pub(crate) fn mean_pool(tokens: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0f32; dim];
    let mut count = 0f32;
    for (row, &m) in tokens.chunks(dim).zip(mask.iter()) {
        if m == 0 {
            continue;
        }
        for (acc, &val) in pooled.iter_mut().zip(row) {
            *acc += val;
        }
        count += 1.0;
    }
    if count > 0.0 {
        for val in &mut pooled {
            *val /= count;
        }
    }
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_simple_vector() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize_in_place(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let mut v = vec![0.0f32, 0.0, 0.0];
        l2_normalize_in_place(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn l2_normalize_is_idempotent() {
        let mut v = vec![1.0f32, 2.0, 3.0];
        l2_normalize_in_place(&mut v);
        let first = v.clone();
        l2_normalize_in_place(&mut v);
        for (a, b) in v.iter().zip(first.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn mean_pool_skips_padding() {
        // three positions of dim 2, last one is padding
        let tokens = vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let pooled = mean_pool(&tokens, &[1, 1, 0], 2);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn mean_pool_all_masked_is_zero() {
        let pooled = mean_pool(&[1.0, 1.0], &[0], 2);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }
}
