use super::*;

fn p(s: &str) -> Partition {
    s.parse().unwrap()
}

#[test]
fn test_parse_and_display() {
    let part = p("2 3 2 1");
    assert_eq!(part.to_string(), "(3 2 2 1)");
    assert_eq!(part.show_brief(), "3 2x2 1");
    assert_eq!(format!("{:?}", part), "<8: 3 2x2 1>");
    assert_eq!(part.size(), 8);
    assert_eq!(part.parts(), 4);
    assert_eq!(part.max(), 3);
    assert_eq!(part.min(), 1);
}

#[test]
fn test_parse_empty_and_errors() {
    assert!(p("").is_empty());
    assert!(p("None").is_empty());
    assert_eq!(Partition::new().show_brief(), "None");
    assert_eq!("3 0".parse::<Partition>(), Err(PartitionParseError::Zero));
    assert_eq!(
        "3 x".parse::<Partition>(),
        Err(PartitionParseError::UnexpectedChar('x'))
    );
    assert_eq!(
        "99999999999999999999999".parse::<Partition>(),
        Err(PartitionParseError::Oversize)
    );
}

#[test]
fn test_add_sub_keeps_normal_form() {
    let mut part = p("4 1");
    part.sub(4);
    assert_eq!(part, p("1"));
    assert_eq!(part.max(), 1);
    part.sub(1);
    assert_eq!(part, Partition::new());
}

#[test]
fn test_contains_at_least_and_at_most() {
    let part = p("5 2");
    assert_eq!(part.contains_at_least(3), Some(5));
    assert_eq!(part.contains_at_least(6), None);
    assert_eq!(part.contains_at_most(4), Some(2));
    assert_eq!(part.contains_at_most(1), None);
}

#[test]
fn test_sum_and_difference_sizes() {
    let a = p("3 2 2");
    let b = p("2 1");
    let mut s = a.clone();
    s.sum(&b);
    assert_eq!(s.size(), a.size() + b.size());
    assert_eq!(s, p("3 2 2 2 1"));

    let mut d = a.clone();
    d.difference(&b);
    assert_eq!(d, p("3 2"));
    assert!(d.size() <= a.size());
    assert!(a.covers(&d));
}

#[test]
fn test_div_and_round() {
    let mut part = p("2 2 2 1");
    part.div_and_round(2);
    // 3 twos -> 2 (1.5 rounds up), 1 one -> 1 (0.5 rounds up)
    assert_eq!(part, p("2 2 1"));

    let mut part = p("2 2 2 1");
    part.div(2);
    assert_eq!(part, p("2"));
}

#[test]
fn test_max_to_limit() {
    let mut part = p("2");
    part.max_to_limit(&p("3 2 2"), 6);
    // 3 fits (size 5), second 2 would make 7
    assert_eq!(part, p("3 2"));
}

#[test]
fn test_partitions_of() {
    let all = Partition::partitions_of(4, 4);
    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|q| q.size() == 4));
    let capped = Partition::partitions_of(4, 2);
    assert_eq!(capped.len(), 3);
    assert!(capped.iter().all(|q| q.max() <= 2));
}

#[test]
fn test_partitions_up_to() {
    let all = Partition::partitions_up_to(2, 2);
    // (), (1), (1 1), (2)
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|q| q.size() <= 2));
}

#[test]
fn test_bin_pack() {
    assert!(p("2 2 2").bin_pack(&p("4 2")));
    assert!(!p("2 2 2").bin_pack(&p("3 3")));
    assert!(p("3 1 1 1").bin_pack(&p("3 3")));
    assert!(!p("4").bin_pack(&p("3 3")));
}

#[test]
fn test_bin_pack_and_how_three_twos() {
    let how = p("2 2 2").bin_pack_and_how(&p("2 2 2")).unwrap();
    assert_eq!(how.len(), 3);
    assert!(how.iter().all(|q| *q == p("2")));
}

#[test]
fn test_bin_pack_and_how_failure() {
    assert!(p("2 2 2 1").bin_pack_and_how(&p("3 3")).is_none());
    assert!(p("3 3").bin_pack_and_how(&p("4 2")).is_none());
}
