// Exit codes; clap reports usage errors itself with status 2.
pub const EXIT_FAILURE: i32 = 1;
