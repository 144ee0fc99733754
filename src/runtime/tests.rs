use super::*;

fn parse(args: &[&str]) -> Args {
    Args::parse(args.iter().map(|s| s.to_string()))
}

#[test]
fn no_args_means_current_directory_and_tui() {
    assert_eq!(parse(&[]), Args::default());
}

#[test]
fn first_positional_is_the_music_dir() {
    let args = parse(&["/music", "/ignored"]);
    assert_eq!(args.dir, Some(PathBuf::from("/music")));
    assert!(!args.print_config);
}

#[test]
fn print_config_flag_anywhere() {
    let args = parse(&["/music", "--print-config"]);
    assert!(args.print_config);
    assert_eq!(args.dir, Some(PathBuf::from("/music")));
}
