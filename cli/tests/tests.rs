mod common;

mod test_bucket;
mod test_config;

use common::TestCli;
