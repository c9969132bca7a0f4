use std::{env::current_dir, fs::create_dir_all};

use cosmwasm_schema::{export_schema, remove_schemas, schema_for};

use ballast::cdp::{Config, ExecuteMsg, InstantiateMsg, QueryMsg, TotalPrincipalResponse};
use ballast::types::{AugmentedCDP, CollateralState, Deposit};

fn main() {
    let mut out_dir = current_dir().unwrap();
    out_dir.push("schema");
    create_dir_all(&out_dir).unwrap();
    remove_schemas(&out_dir).unwrap();

    export_schema(&schema_for!(InstantiateMsg), &out_dir);
    export_schema(&schema_for!(ExecuteMsg), &out_dir);
    export_schema(&schema_for!(QueryMsg), &out_dir);
    export_schema(&schema_for!(Config), &out_dir);
    export_schema(&schema_for!(AugmentedCDP), &out_dir);
    export_schema(&schema_for!(Deposit), &out_dir);
    export_schema(&schema_for!(CollateralState), &out_dir);
    export_schema(&schema_for!(TotalPrincipalResponse), &out_dir);
}
