// crates/azure-ops-core/src/scripts.rs
// ============================================================================
// Module: Guest Scripts
// Description: Inline script templates shipped through the run-command channel.
// Purpose: Build OS-specific service-restart and process-sampling scripts.
// Dependencies: azure-ops-core::client
// ============================================================================

//! ## Overview
//! Builds the inline scripts executed inside guests. Values interpolated into
//! a script must first pass [`is_safe_token`]; callers reject anything else
//! before a script is built, so the templates never see shell metacharacters.
//! The Linux sampler collects both process snapshots first and serializes the
//! JSON document afterwards in a single awk program that escapes quotes and
//! backslashes in process names; it never streams JSON from a pipe loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::client::GuestCommand;
use crate::client::OsType;

// ============================================================================
// SECTION: Token Safety
// ============================================================================

/// Returns true when a value is safe to interpolate into a guest script.
///
/// Accepts the character set Azure allows for VM and service names; anything
/// else (quotes, whitespace, shell metacharacters) is rejected by callers
/// before a script is built.
#[must_use]
pub fn is_safe_token(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 128
        && value.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}

// ============================================================================
// SECTION: Service Restart Scripts
// ============================================================================

/// Shell body for the Linux service restart flow.
///
/// Expects `SERVICE_NAME` and `VM_NAME` to be defined by the header.
const LINUX_SERVICE_RESTART: &str = r##"
echo "=== SERVICE RESTART ==="
echo "Service: $SERVICE_NAME"
echo "VM: $VM_NAME"
echo ""

if ! systemctl list-units --type=service --all | grep -q "$SERVICE_NAME.service"; then
    echo "❌ Service '$SERVICE_NAME' not found on this VM"
    echo ""
    echo "Available services:"
    systemctl list-units --type=service --state=running | head -n 15
    exit 1
fi

echo "Current status:"
systemctl status "$SERVICE_NAME" --no-pager | head -n 5
echo ""

echo "🔄 Restarting service..."
if systemctl restart "$SERVICE_NAME"; then
    sleep 2
    if systemctl is-active --quiet "$SERVICE_NAME"; then
        echo "✅ Service restarted successfully!"
        echo "New status:"
        systemctl status "$SERVICE_NAME" --no-pager | head -n 5
    else
        echo "⚠️  Service restarted but may not be running properly"
        systemctl status "$SERVICE_NAME" --no-pager | head -n 10
    fi
else
    echo "❌ Failed to restart service"
    systemctl status "$SERVICE_NAME" --no-pager
    exit 1
fi
"##;

/// PowerShell body for the Windows service restart flow.
///
/// Expects `$serviceName` and `$vmName` to be defined by the header.
const WINDOWS_SERVICE_RESTART: &str = r##"
Write-Host "=== SERVICE RESTART ==="
Write-Host "Service: $serviceName"
Write-Host "VM: $vmName"
Write-Host ""

$service = Get-Service -Name $serviceName -ErrorAction SilentlyContinue

if ($null -eq $service) {
    Write-Host "❌ Service '$serviceName' not found on this VM"
    Write-Host ""
    Write-Host "Available services:"
    Get-Service | Where-Object { $_.Status -eq 'Running' } | Select-Object -First 10 Name, DisplayName | Format-Table -AutoSize
    exit 1
}

Write-Host "Current status: $($service.Status)"
Write-Host ""

try {
    Write-Host "🔄 Restarting service..."
    Restart-Service -Name $serviceName -Force -ErrorAction Stop
    Start-Sleep -Seconds 2

    $service = Get-Service -Name $serviceName

    if ($service.Status -eq 'Running') {
        Write-Host "✅ Service restarted successfully!"
        Write-Host "New status: $($service.Status)"
    } else {
        Write-Host "⚠️  Service restarted but status is: $($service.Status)"
    }
} catch {
    Write-Host "❌ Failed to restart service: $($_.Exception.Message)"
    exit 1
}
"##;

/// Builds the service restart script for a guest OS family.
#[must_use]
pub fn service_restart(os_type: OsType, service_name: &str, vm_name: &str) -> GuestCommand {
    match os_type {
        OsType::Linux => GuestCommand {
            command_id: "RunShellScript",
            script: format!(
                "#!/bin/bash\nSERVICE_NAME=\"{service_name}\"\nVM_NAME=\"{vm_name}\"\n{LINUX_SERVICE_RESTART}"
            ),
        },
        OsType::Windows => GuestCommand {
            command_id: "RunPowerShellScript",
            script: format!(
                "$serviceName = \"{service_name}\"\n$vmName = \"{vm_name}\"\n{WINDOWS_SERVICE_RESTART}"
            ),
        },
    }
}

// ============================================================================
// SECTION: Process Sampling Scripts
// ============================================================================

/// Shell body for the Linux process sampler.
///
/// Takes two `/proc` snapshots separated by `SAMPLE_SECONDS`, then joins the
/// deltas and serializes the JSON document in one awk pass. Process names are
/// extracted between the stat parentheses and escaped before emission.
const LINUX_PROCESS_SAMPLER: &str = r##"
CPU_CORES=$(nproc)
TOTAL_MEM_KB=$(awk '/^MemTotal:/ {print $2}' /proc/meminfo)
CLK_TCK=$(getconf CLK_TCK)
PAGE_BYTES=$(getconf PAGESIZE)

snapshot() {
    awk '{
        line = $0
        pid = $1
        name = line
        sub(/^[0-9]+ \(/, "", name)
        sub(/\)[^)]*$/, "", name)
        rest = line
        sub(/^.*\) /, "", rest)
        n = split(rest, f, " ")
        if (n >= 22) {
            print pid "\t" name "\t" f[12] + f[13] "\t" f[22]
        }
    }' /proc/[0-9]*/stat 2>/dev/null
}

SNAP1=$(snapshot)
sleep "$SAMPLE_SECONDS"
SNAP2=$(snapshot)

awk -F '\t' \
    -v sample="$SAMPLE_SECONDS" -v cores="$CPU_CORES" -v clk="$CLK_TCK" \
    -v page="$PAGE_BYTES" -v total_kb="$TOTAL_MEM_KB" -v top_n="$TOP_N" \
    -v vm_name="$VM_NAME" '
function esc(s) {
    gsub(/\\/, "\\\\", s)
    gsub(/"/, "\\\"", s)
    return s
}
NR == FNR {
    first[$1] = $3
    next
}
{
    if ($1 in first) {
        count += 1
        pid[count] = $1
        name[count] = $2
        cpu[count] = ($3 - first[$1]) / clk / sample / cores * 100
        mem_mb[count] = $4 * page / 1048576
        mem_pct[count] = $4 * page / (total_kb * 1024) * 100
    }
}
END {
    for (i = 1; i <= count; i++) {
        for (j = i + 1; j <= count; j++) {
            if (cpu[j] > cpu[i]) {
                tp = pid[i]; pid[i] = pid[j]; pid[j] = tp
                tn = name[i]; name[i] = name[j]; name[j] = tn
                tc = cpu[i]; cpu[i] = cpu[j]; cpu[j] = tc
                tm = mem_mb[i]; mem_mb[i] = mem_mb[j]; mem_mb[j] = tm
                tq = mem_pct[i]; mem_pct[i] = mem_pct[j]; mem_pct[j] = tq
            }
        }
    }
    limit = count < top_n ? count : top_n
    printf "{\n"
    printf "  \"success\": true,\n"
    printf "  \"vm_name\": \"%s\",\n", esc(vm_name)
    printf "  \"os_type\": \"linux\",\n"
    printf "  \"sample_seconds\": %d,\n", sample
    printf "  \"cpu_cores\": %d,\n", cores
    printf "  \"total_memory_gb\": %.2f,\n", total_kb / 1048576
    printf "  \"processes\": [\n"
    for (i = 1; i <= limit; i++) {
        printf "    {\"process_name\": \"%s\", \"pid\": %d, \"cpu_percent\": %.2f, \"memory_mb\": %.2f, \"memory_percent\": %.2f}%s\n", \
            esc(name[i]), pid[i], cpu[i], mem_mb[i], mem_pct[i], (i < limit ? "," : "")
    }
    printf "  ]\n"
    printf "}\n"
}' <(printf '%s\n' "$SNAP1") <(printf '%s\n' "$SNAP2")
"##;

/// PowerShell body for the Windows process sampler.
///
/// Expects `$SampleSeconds`, `$TopN`, and `$vmName` from the header; the
/// document is assembled after both snapshots and serialized by
/// `ConvertTo-Json`.
const WINDOWS_PROCESS_SAMPLER: &str = r##"
$proc1 = Get-Process | Select-Object Id, Name, CPU, WorkingSet64

Start-Sleep -Seconds $SampleSeconds

$proc2 = Get-Process | Select-Object Id, Name, CPU, WorkingSet64

$cpuCount = (Get-WmiObject Win32_ComputerSystem).NumberOfLogicalProcessors
$totalMem = (Get-WmiObject Win32_OperatingSystem).TotalVisibleMemorySize * 1KB

$result = foreach ($p2 in $proc2) {
    $p1 = $proc1 | Where-Object { $_.Id -eq $p2.Id }
    if ($p1 -and $p2.CPU -ne $null) {
        $cpuDelta = ($p2.CPU - $p1.CPU)
        $cpuPct = [math]::Round(($cpuDelta / $SampleSeconds / $cpuCount) * 100, 2)
        $memPct = [math]::Round(($p2.WorkingSet64 / $totalMem) * 100, 2)
        [PSCustomObject]@{
            process_name = $p2.Name
            pid = $p2.Id
            cpu_percent = $cpuPct
            memory_mb = [math]::Round($p2.WorkingSet64 / 1MB, 2)
            memory_percent = $memPct
        }
    }
}

$output = @{
    success = $true
    vm_name = $vmName
    os_type = "windows"
    sample_seconds = $SampleSeconds
    cpu_cores = $cpuCount
    total_memory_gb = [math]::Round($totalMem / 1GB, 2)
    processes = @($result | Sort-Object -Property cpu_percent -Descending | Select-Object -First $TopN)
}

$output | ConvertTo-Json -Depth 3
"##;

/// Builds the process sampling script for a guest OS family.
#[must_use]
pub fn process_sample(
    os_type: OsType,
    vm_name: &str,
    sample_seconds: i64,
    top_n: i64,
) -> GuestCommand {
    match os_type {
        OsType::Linux => GuestCommand {
            command_id: "RunShellScript",
            script: format!(
                "#!/bin/bash\nSAMPLE_SECONDS={sample_seconds}\nTOP_N={top_n}\nVM_NAME=\"{vm_name}\"\n{LINUX_PROCESS_SAMPLER}"
            ),
        },
        OsType::Windows => GuestCommand {
            command_id: "RunPowerShellScript",
            script: format!(
                "$SampleSeconds = {sample_seconds}\n$TopN = {top_n}\n$vmName = \"{vm_name}\"\n{WINDOWS_PROCESS_SAMPLER}"
            ),
        },
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
