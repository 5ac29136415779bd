pub mod luup;
