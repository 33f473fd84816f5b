mod support;

mod highlight_tests;
