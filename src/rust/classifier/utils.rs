use ndarray::Array1;

/// Index of the largest entry; the first one wins on ties. NaN entries never win.
pub(crate) fn argmax(vec: &Array1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in vec.iter().enumerate() {
        if x.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if x <= b => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

pub(crate) fn one_hot(size: usize, index: usize) -> Array1<f64> {
    let mut vec = Array1::zeros(size);
    if index < size {
        vec[index] = 1.0;
    }
    vec
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&array![0.1, 0.9, 0.9, 0.2]), Some(1));
        assert_eq!(argmax(&array![0.5]), Some(0));
        assert_eq!(argmax(&array![f64::NAN, 0.2, 0.1]), Some(1));
        assert_eq!(argmax(&Array1::zeros(0)), None);
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(one_hot(3, 1), array![0.0, 1.0, 0.0]);
        assert_eq!(one_hot(2, 5), array![0.0, 0.0]);
    }
}
