pub mod artifacts_generate;
