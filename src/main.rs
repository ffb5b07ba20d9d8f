// ==========================================
// 经销商销售台账系统 - 无头批处理入口
// ==========================================
// 用法:
//   dealer-ledger <db_path> <file.csv|.xlsx>   导入销售文件
//   dealer-ledger --template <out.csv>         生成导入模板
// 说明: 无头路径无法收集人工裁决，存在未匹配经销商时
//       打印名称清单并以非零码退出
// ==========================================

use dealer_ledger::api::error::ApiError;
use dealer_ledger::importer::write_template_file;
use dealer_ledger::ImportApi;

#[tokio::main]
async fn main() {
    // 初始化日志系统
    dealer_ledger::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 批量导入引擎", dealer_ledger::APP_NAME);
    tracing::info!("系统版本: {}", dealer_ledger::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().collect();

    let exit_code = match args.as_slice() {
        [_, flag, out_path] if flag == "--template" => match write_template_file(out_path) {
            Ok(()) => {
                tracing::info!(path = %out_path, "模板已生成");
                0
            }
            Err(e) => {
                tracing::error!(error = %e, "模板生成失败");
                1
            }
        },
        [_, db_path, file_path] => run_import(db_path, file_path).await,
        _ => {
            eprintln!("用法: dealer-ledger <db_path> <file.csv|.xlsx>");
            eprintln!("      dealer-ledger --template <out.csv>");
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run_import(db_path: &str, file_path: &str) -> i32 {
    tracing::info!("使用数据库: {}", db_path);

    let api = ImportApi::new(db_path.to_string());
    match api.import_sales_file(file_path).await {
        Ok(response) => {
            tracing::info!(
                run_id = %response.run_id,
                total = response.total_rows,
                imported = response.imported,
                failed = response.failed,
                invalid = response.invalid,
                elapsed_ms = response.elapsed_ms,
                "导入完成"
            );
            for err in &response.validation_errors {
                tracing::warn!(row = err.row, reason = %err.message, "行被校验排除");
            }
            for err in &response.commit_errors {
                tracing::warn!(row = err.row, reason = %err.message, "行提交失败");
            }
            0
        }
        Err(ApiError::UnresolvedDealers { names }) => {
            tracing::error!(count = names.len(), "存在未匹配经销商，须人工指定后重试");
            for name in names {
                eprintln!("未匹配经销商: {name}");
            }
            1
        }
        Err(e) => {
            tracing::error!(error = %e, "导入失败");
            1
        }
    }
}
