//! CSV fixtures for E2E testing

/// A submission CSV and how the API is expected to treat it.
#[derive(Debug, Clone, Copy)]
pub struct TestCsvFixture {
    pub name: &'static str,
    pub csv: &'static str,
    pub should_accept: bool,
    pub description: &'static str,
}

pub const TEST_FIXTURES: &[TestCsvFixture] = &[
    TestCsvFixture {
        name: "single_row",
        csv: "S. No.,Product Name,Input Image Urls\n\
              1,SKU1 Widget,http://127.0.0.1:59999/a.jpg\n",
        should_accept: true,
        description: "One row, one unreachable URL - completes with an empty output field",
    },
    TestCsvFixture {
        name: "multi_url_rows",
        csv: "S. No.,Product Name,Input Image Urls\n\
              1,SKU1 Widget,\"http://127.0.0.1:59999/a.jpg,http://127.0.0.1:59999/b.jpg\"\n\
              2,SKU2 Gadget,http://127.0.0.1:59999/c.png\n\
              3,SKU3 Gizmo,\"http://127.0.0.1:59999/d.jpg,http://127.0.0.1:59999/e.jpg\"\n",
        should_accept: true,
        description: "Three rows with mixed URL counts",
    },
    TestCsvFixture {
        name: "missing_urls_column",
        csv: "S. No.,Product Name\n1,SKU1 Widget\n",
        should_accept: false,
        description: "Missing the Input Image Urls column - rejected synchronously",
    },
    TestCsvFixture {
        name: "header_only",
        csv: "S. No.,Product Name,Input Image Urls\n",
        should_accept: false,
        description: "No data rows - rejected synchronously",
    },
    TestCsvFixture {
        name: "bad_serial",
        csv: "S. No.,Product Name,Input Image Urls\nfoo,SKU1 Widget,http://127.0.0.1:59999/a.jpg\n",
        should_accept: false,
        description: "Non-numeric serial number - rejected synchronously",
    },
];
