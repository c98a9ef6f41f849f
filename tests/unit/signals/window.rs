use stockwatch::signals::window::{change_percent, max, mean, min, sma, tail};

#[test]
fn tail_shrinks_to_available_history() {
    let values = [1.0, 2.0, 3.0];
    assert_eq!(tail(&values, 2), &[2.0, 3.0]);
    assert_eq!(tail(&values, 10), &values);
    assert!(tail(&[], 5).is_empty());
}

#[test]
fn statistics_on_empty_input_are_none() {
    assert_eq!(mean(&[]), None);
    assert_eq!(min(&[]), None);
    assert_eq!(max(&[]), None);
    assert_eq!(sma(&[], 20), None);
}

#[test]
fn statistics_over_values() {
    let values = [4.0, 8.0, 6.0, 2.0];
    assert_eq!(mean(&values), Some(5.0));
    assert_eq!(min(&values), Some(2.0));
    assert_eq!(max(&values), Some(8.0));
    assert_eq!(sma(&values, 2), Some(4.0));
}

#[test]
fn change_percent_uses_last_two_values() {
    assert_eq!(change_percent(&[50.0, 100.0, 110.0]), 10.0);
    assert_eq!(change_percent(&[100.0]), 0.0);
    assert_eq!(change_percent(&[]), 0.0);
    assert_eq!(change_percent(&[0.0, 5.0]), 0.0);
}
