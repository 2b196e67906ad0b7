mod command_tests;
mod config_tests;
mod deploy_tests;
mod poll_tests;
mod provider_tests;
mod workflow_tests;
