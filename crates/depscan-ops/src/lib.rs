pub mod ops_scan;
